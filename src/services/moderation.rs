use crate::models::{ModerationRequest, MovieStatus, RequestAction, RequestStatus};

/// Admin verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn request_status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }

    fn movie_status(self) -> MovieStatus {
        match self {
            Decision::Approve => MovieStatus::Approved,
            Decision::Reject => MovieStatus::Rejected,
        }
    }
}

/// Outcome of resolving a request: the updated request plus the status the
/// referenced movie should move to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub request: ModerationRequest,
    pub movie_status: Option<MovieStatus>,
}

/// Pure transition function for the request state machine:
/// `Pending -> {Approved, Rejected}`, both terminal.
///
/// Returns `None` for a request already in a terminal state so the caller
/// does not re-fire side effects. A rejected upload keeps its movie record;
/// it simply never appears in viewer-facing listings.
pub fn resolve(request: &ModerationRequest, decision: Decision) -> Option<Resolution> {
    if request.status.is_terminal() {
        return None;
    }

    let mut updated = request.clone();
    updated.status = decision.request_status();

    // Only upload requests are driven end-to-end; edit/delete/promote are
    // reserved actions with no movie side effect yet.
    let movie_status = match request.action {
        RequestAction::Upload => Some(decision.movie_status()),
        _ => None,
    };

    Some(Resolution {
        request: updated,
        movie_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(status: RequestStatus, action: RequestAction) -> ModerationRequest {
        ModerationRequest {
            id: "req_1".to_string(),
            creator_id: "u1".to_string(),
            creator_name: "Ana".to_string(),
            movie_id: "mov_1".to_string(),
            movie_title: "Solaris".to_string(),
            action,
            status,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_approve_pending_upload() {
        let req = request(RequestStatus::Pending, RequestAction::Upload);
        let res = resolve(&req, Decision::Approve).unwrap();
        assert_eq!(res.request.status, RequestStatus::Approved);
        assert_eq!(res.movie_status, Some(MovieStatus::Approved));
    }

    #[test]
    fn test_reject_pending_upload() {
        let req = request(RequestStatus::Pending, RequestAction::Upload);
        let res = resolve(&req, Decision::Reject).unwrap();
        assert_eq!(res.request.status, RequestStatus::Rejected);
        assert_eq!(res.movie_status, Some(MovieStatus::Rejected));
    }

    #[test]
    fn test_terminal_requests_do_not_transition() {
        let approved = request(RequestStatus::Approved, RequestAction::Upload);
        assert!(resolve(&approved, Decision::Approve).is_none());
        assert!(resolve(&approved, Decision::Reject).is_none());

        let rejected = request(RequestStatus::Rejected, RequestAction::Upload);
        assert!(resolve(&rejected, Decision::Approve).is_none());
    }

    #[test]
    fn test_reserved_actions_have_no_movie_effect() {
        for action in [
            RequestAction::Edit,
            RequestAction::Delete,
            RequestAction::Promote,
        ] {
            let req = request(RequestStatus::Pending, action);
            let res = resolve(&req, Decision::Approve).unwrap();
            assert_eq!(res.request.status, RequestStatus::Approved);
            assert_eq!(res.movie_status, None);
        }
    }
}
