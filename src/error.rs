use thiserror::Error;

/// Failure taxonomy surfaced by the [`Store`](crate::services::store::Store)
/// facade. Callers are expected to show `AuthFailed`, `InsufficientCredits`
/// and `PersistenceFailed` to the end user; `NotFound` on optional lookups
/// is an ordinary absent-value case.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] BackendError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Adapter-level failures. The facade converts these into `StoreError`;
/// only `NotFound` keeps its identity across the boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Transaction aborted: {0}")]
    TxAborted(String),
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(e: validator::ValidationErrors) -> Self {
        StoreError::InvalidInput(e.to_string())
    }
}
