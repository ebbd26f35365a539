use crate::config::RemoteConfig;
use crate::error::StoreError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Opaque result of a successful login or registration. How credentials
/// were verified is the authenticator's business; the store only needs a
/// stable uid to resolve a profile document against.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, StoreError>;

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, StoreError>;

    async fn sign_out(&self);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialRecord {
    uid: String,
    name: String,
    password_hash: String,
}

/// Credential vault for local mode: one JSON file under the data directory
/// mapping email to an argon2 hash. Plaintext passwords never touch disk.
pub struct LocalAuthenticator {
    path: PathBuf,
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl LocalAuthenticator {
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StoreError::AuthFailed(format!("credential vault unavailable: {e}")))?;
        let path = data_dir.join("credentials.json");
        let records = if path.exists() {
            let raw = tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::AuthFailed(format!("credential vault unreadable: {e}")))?;
            serde_json::from_slice(&raw)
                .map_err(|e| StoreError::AuthFailed(format!("credential vault corrupt: {e}")))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn persist(
        &self,
        records: &HashMap<String, CredentialRecord>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::AuthFailed(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| StoreError::AuthFailed(format!("credential vault write failed: {e}")))
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, StoreError> {
        let records = self.records.lock().await;
        let record = records
            .get(email)
            .ok_or_else(|| StoreError::AuthFailed("invalid credentials".to_string()))?;

        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| StoreError::AuthFailed(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| StoreError::AuthFailed("invalid credentials".to_string()))?;

        Ok(AuthIdentity {
            uid: record.uid.clone(),
            email: email.to_string(),
            display_name: Some(record.name.clone()),
        })
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(email) {
            return Err(StoreError::AlreadyExists(format!(
                "account already registered for {email}"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::AuthFailed(e.to_string()))?
            .to_string();

        let record = CredentialRecord {
            uid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            password_hash,
        };
        records.insert(email.to_string(), record.clone());
        self.persist(&records).await?;
        debug!("🔐 Registered local account for {}", email);

        Ok(AuthIdentity {
            uid: record.uid,
            email: email.to_string(),
            display_name: Some(record.name),
        })
    }

    async fn sign_out(&self) {}
}

#[derive(Serialize)]
struct RemoteAuthRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RemoteAuthResponse {
    uid: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Thin client for the remote backend's auth endpoints. Credential
/// verification happens server-side; this type only carries the transport.
pub struct RemoteAuthenticator {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RemoteAuthenticator {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn auth_url(&self, action: &str) -> String {
        format!("{}/v1/auth:{}", self.endpoint, action)
    }

    async fn call(
        &self,
        action: &str,
        body: &RemoteAuthRequest<'_>,
        email: &str,
    ) -> Result<AuthIdentity, StoreError> {
        let response = self
            .client
            .post(self.auth_url(action))
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::AuthFailed(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists(format!(
                "account already registered for {email}"
            ))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(format!("no account for {email}"))),
            status if !status.is_success() => {
                Err(StoreError::AuthFailed(format!("{action} rejected: {status}")))
            }
            _ => {
                let body: RemoteAuthResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::AuthFailed(e.to_string()))?;
                Ok(AuthIdentity {
                    uid: body.uid,
                    email: email.to_string(),
                    display_name: body.display_name,
                })
            }
        }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, StoreError> {
        self.call(
            "signIn",
            &RemoteAuthRequest {
                name: None,
                email,
                password,
            },
            email,
        )
        .await
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, StoreError> {
        self.call(
            "signUp",
            &RemoteAuthRequest {
                name: Some(name),
                email,
                password,
            },
            email,
        )
        .await
    }

    async fn sign_out(&self) {
        // Best effort; the session is server-side state we do not track.
        if let Err(e) = self
            .client
            .post(self.auth_url("signOut"))
            .header("x-api-key", &self.api_key)
            .send()
            .await
        {
            warn!("Sign-out call failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_sign_up_and_in() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuthenticator::new(dir.path()).await.unwrap();

        let identity = auth.sign_up("Ana", "ana@example.com", "s3cret").await.unwrap();
        assert_eq!(identity.email, "ana@example.com");
        assert_eq!(identity.display_name.as_deref(), Some("Ana"));

        let again = auth.sign_in("ana@example.com", "s3cret").await.unwrap();
        assert_eq!(again.uid, identity.uid);
    }

    #[tokio::test]
    async fn test_local_rejects_bad_password_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuthenticator::new(dir.path()).await.unwrap();
        auth.sign_up("Ana", "ana@example.com", "s3cret").await.unwrap();

        let err = auth.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::AuthFailed(_)));

        let err = auth
            .sign_up("Ana Again", "ana@example.com", "other")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_no_plaintext_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuthenticator::new(dir.path()).await.unwrap();
        auth.sign_up("Ana", "ana@example.com", "hunter2!").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("credentials.json")).unwrap();
        assert!(!raw.contains("hunter2!"));
        assert!(raw.contains("$argon2"));
    }
}
