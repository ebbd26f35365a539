use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Viewer,
    Creator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Upload,
    Edit,
    Delete,
    Promote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Approved and Rejected are terminal; the workflow never leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Spendable balance. Only meaningful for creators; admins carry a
    /// sentinel-high value and viewers stay at 0.
    pub credits: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Legacy plaintext credential field carried by old records. Must never
    /// reach the backend through `update_user`; see `Store::update_user`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    /// Weak reference to the owning user; a lookup key, not an ownership edge.
    pub creator_id: String,
    pub creator_name: String,
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub watch_link: String,
    pub category_id: String,
    /// Vertical poster (2:3).
    pub cover_image: String,
    /// Horizontal backdrop (16:9).
    pub backdrop_image: String,
    pub status: MovieStatus,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A pending decision record created alongside a creator action.
///
/// `creator_name` and `movie_title` are denormalized for display and are
/// intentionally stale-tolerant: a request read after its movie is gone
/// legitimately shows the old title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub id: String,
    pub creator_id: String,
    pub creator_name: String,
    pub movie_id: String,
    pub movie_title: String,
    pub action: RequestAction,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
}

/// Singleton settings record. Overwritten wholesale on update; there are no
/// partial-patch semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub sponsor_link: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sponsor_link: "https://google.com".to_string(),
        }
    }
}

/// Creator-supplied fields for a new movie submission. Everything else on
/// [`Movie`] is filled in by the store at submit time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MovieDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: String,
    #[validate(range(min = 1888, max = 2100))]
    pub release_year: i32,
    #[validate(url)]
    pub watch_link: String,
    #[validate(length(min = 1))]
    pub category_id: String,
    pub cover_image: String,
    pub backdrop_image: String,
}

impl Movie {
    pub fn from_draft(draft: MovieDraft, creator: &User) -> Self {
        Self {
            id: format!("mov_{}", uuid::Uuid::new_v4()),
            creator_id: creator.id.clone(),
            creator_name: creator.name.clone(),
            title: draft.title,
            description: draft.description,
            release_year: draft.release_year,
            watch_link: draft.watch_link,
            category_id: draft.category_id,
            cover_image: draft.cover_image,
            backdrop_image: draft.backdrop_image,
            status: MovieStatus::Pending,
            views: 0,
            created_at: Utc::now(),
        }
    }
}

impl ModerationRequest {
    pub fn for_upload(movie: &Movie) -> Self {
        Self {
            id: format!("req_{}", uuid::Uuid::new_v4()),
            creator_id: movie.creator_id.clone(),
            creator_name: movie.creator_name.clone(),
            movie_id: movie.id.clone(),
            movie_title: movie.title.clone(),
            action: RequestAction::Upload,
            status: RequestStatus::Pending,
            timestamp: Utc::now(),
        }
    }
}
