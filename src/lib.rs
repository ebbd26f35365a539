pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;

pub use config::StoreConfig;
pub use error::{BackendError, StoreError};
pub use services::store::Store;

use std::sync::Arc;

/// Build a ready-to-use [`Store`] from configuration: pick the backend
/// (remote document store or local fallback) once, wire in the matching
/// authenticator and hand back the facade.
pub async fn setup_store(config: &StoreConfig) -> Result<Arc<Store>, StoreError> {
    let (adapter, auth) = infrastructure::setup_backend(config).await?;
    Ok(Arc::new(Store::new(adapter, auth)))
}
