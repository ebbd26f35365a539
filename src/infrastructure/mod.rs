pub mod seed;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::services::backend::{BackendAdapter, LocalAdapter, RemoteAdapter};
use crate::services::identity::{Authenticator, LocalAuthenticator, RemoteAuthenticator};
use std::sync::Arc;
use tracing::info;

/// Boot-time backend selection. Valid remote configuration picks the
/// networked document store; anything else falls back to the local store.
/// The choice is made exactly once and injected into the store facade, so
/// business logic never branches on mode.
pub async fn setup_backend(
    config: &StoreConfig,
) -> Result<(Arc<dyn BackendAdapter>, Arc<dyn Authenticator>), StoreError> {
    if let Some(remote) = &config.remote {
        info!(
            "☁️  Remote backend: {} (project: {})",
            remote.endpoint, remote.project_id
        );
        let adapter: Arc<dyn BackendAdapter> = Arc::new(RemoteAdapter::new(remote));
        let auth: Arc<dyn Authenticator> = Arc::new(RemoteAuthenticator::new(remote));
        return Ok((adapter, auth));
    }

    info!("💾 Local backend: {}", config.data_dir.display());
    let adapter: Arc<dyn BackendAdapter> = Arc::new(
        LocalAdapter::new(&config.data_dir, seed::default_seed())
            .await
            .map_err(StoreError::PersistenceFailed)?,
    );
    let auth: Arc<dyn Authenticator> = Arc::new(LocalAuthenticator::new(&config.data_dir).await?);
    Ok((adapter, auth))
}
