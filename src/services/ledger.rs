use crate::error::StoreError;
use crate::models::{RequestAction, User};

/// Fixed cost table for credit-gated creator actions.
pub fn cost_of(action: RequestAction) -> u32 {
    match action {
        RequestAction::Upload => 10,
        RequestAction::Edit => 5,
        RequestAction::Delete => 5,
        RequestAction::Promote => 10,
    }
}

pub fn can_afford(user: &User, cost: u32) -> bool {
    user.credits >= cost
}

/// Deduct `cost` from the user's balance and return the new value.
///
/// Never mutates in place and never produces a negative balance; an
/// unaffordable debit fails with `InsufficientCredits` before anything
/// changes. The caller persists the result through the store facade.
pub fn debit(user: &User, cost: u32) -> Result<User, StoreError> {
    if !can_afford(user, cost) {
        return Err(StoreError::InsufficientCredits {
            required: cost,
            available: user.credits,
        });
    }
    let mut updated = user.clone();
    updated.credits -= cost;
    Ok(updated)
}

/// Unconditional credit. The sponsor-link flow calls this only after it has
/// independently verified its completion condition; the ledger just applies
/// the delta.
pub fn credit(user: &User, amount: u32) -> User {
    let mut updated = user.clone();
    updated.credits = updated.credits.saturating_add(amount);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn creator(credits: u32) -> User {
        User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: UserRole::Creator,
            credits,
            avatar_url: None,
            password: None,
            created_at: None,
        }
    }

    #[test]
    fn test_cost_table() {
        assert_eq!(cost_of(RequestAction::Upload), 10);
        assert_eq!(cost_of(RequestAction::Edit), 5);
        assert_eq!(cost_of(RequestAction::Delete), 5);
        assert_eq!(cost_of(RequestAction::Promote), 10);
    }

    #[test]
    fn test_debit_exact_balance() {
        let user = creator(10);
        let updated = debit(&user, 10).unwrap();
        assert_eq!(updated.credits, 0);
        // Input value untouched.
        assert_eq!(user.credits, 10);
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let user = creator(3);
        let err = debit(&user, 10).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientCredits {
                required: 10,
                available: 3
            }
        ));
        assert_eq!(user.credits, 3);
    }

    #[test]
    fn test_credit_is_unconditional() {
        let user = creator(0);
        assert_eq!(credit(&user, 10).credits, 10);
        assert_eq!(credit(&creator(u32::MAX), 1).credits, u32::MAX);
    }
}
