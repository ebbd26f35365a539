use std::env;
use std::path::PathBuf;
use url::Url;

/// Connection parameters for the remote document store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base endpoint, e.g. `https://store.flimlix.app`.
    pub endpoint: Url,
    /// Project/tenant identifier scoping all collections.
    pub project_id: String,
    /// Static API key sent with every request.
    pub api_key: String,
}

/// Boot-time store configuration. Presence of a structurally valid
/// [`RemoteConfig`] selects remote mode; otherwise the local fallback store
/// is used. The decision is made once in `infrastructure::setup_backend`
/// and never revisited for the process lifetime.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub remote: Option<RemoteConfig>,

    /// Data directory for the local store (default: `.flimlix`).
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote: None,
            data_dir: PathBuf::from(".flimlix"),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Remote mode requires `FLIMLIX_ENDPOINT` (a parseable URL),
    /// `FLIMLIX_PROJECT_ID` and `FLIMLIX_API_KEY`. Anything missing or
    /// malformed falls back to local mode.
    pub fn from_env() -> Self {
        let default = Self::default();

        let remote = match (
            env::var("FLIMLIX_ENDPOINT").ok().and_then(|v| Url::parse(&v).ok()),
            env::var("FLIMLIX_PROJECT_ID").ok().filter(|v| !v.is_empty()),
            env::var("FLIMLIX_API_KEY").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(endpoint), Some(project_id), Some(api_key)) => Some(RemoteConfig {
                endpoint,
                project_id,
                api_key,
            }),
            _ => None,
        };

        Self {
            remote,
            data_dir: env::var("FLIMLIX_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.data_dir),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Create config for a throwaway local store rooted at `dir`.
    pub fn local_at(dir: impl Into<PathBuf>) -> Self {
        Self {
            remote: None,
            data_dir: dir.into(),
        }
    }
}
