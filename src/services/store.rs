use crate::error::{BackendError, StoreError};
use crate::infrastructure::seed::{default_categories, SETTINGS_DOC_ID};
use crate::models::{
    AppSettings, Category, ModerationRequest, Movie, MovieDraft, MovieStatus, RequestAction, User,
    UserRole,
};
use crate::services::backend::{
    collections, from_document, partial, to_document, BackendAdapter,
};
use crate::services::identity::{AuthIdentity, Authenticator};
use crate::services::moderation::{self, Decision};
use crate::services::{cascade, ledger};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use validator::Validate;

/// Reserved administrative identity. `login_as_admin` is the only path
/// that can create or promote an account with the Admin role.
const ADMIN_EMAIL: &str = "admin@flimlix.com";
const ADMIN_NAME: &str = "System Admin";
const ADMIN_SECRET: &str = "ILOVEIMRANKHAN369";
const ADMIN_CREDITS: u32 = 9999;

/// Titles permanently retired from listings. Stale seed records carrying
/// these titles keep resurfacing from old datasets; they are filtered out
/// on every read rather than deleted.
const RETIRED_TITLES: &[&str] = &["School Fire Story"];

/// Everything persisted by a successful upload submission.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub user: User,
    pub movie: Movie,
    pub request: ModerationRequest,
}

/// The single entry point the rest of the application talks to. Wraps the
/// active [`BackendAdapter`] and [`Authenticator`] chosen at boot and layers
/// on identity resolution, the credit ledger, the moderation workflow and
/// cascade deletion. Stateless between calls apart from the identity
/// broadcast channel.
pub struct Store {
    adapter: Arc<dyn BackendAdapter>,
    auth: Arc<dyn Authenticator>,
    identity_tx: watch::Sender<Option<User>>,
}

impl Store {
    pub fn new(adapter: Arc<dyn BackendAdapter>, auth: Arc<dyn Authenticator>) -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            adapter,
            auth,
            identity_tx,
        }
    }

    // --- Identity -------------------------------------------------------

    /// Receiver that yields the current authenticated user and every
    /// subsequent identity change. Best effort: dropped receivers are fine.
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<User>> {
        self.identity_tx.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.identity_tx.borrow().clone()
    }

    fn set_identity(&self, user: Option<User>) {
        self.identity_tx.send_replace(user);
    }

    /// Push a new value through the identity channel when the persisted
    /// user is the one currently signed in.
    fn refresh_identity(&self, user: &User) {
        let matches = self
            .identity_tx
            .borrow()
            .as_ref()
            .is_some_and(|current| current.id == user.id);
        if matches {
            self.identity_tx.send_replace(Some(user.clone()));
        }
    }

    /// Resolve an authenticated identity to its profile document, creating
    /// a default Viewer profile when none exists yet. Identities provisioned
    /// out-of-band therefore self-heal on first login.
    async fn resolve_profile(&self, identity: &AuthIdentity) -> Result<User, StoreError> {
        if let Some(doc) = self.adapter.get(collections::USERS, &identity.uid).await? {
            return Ok(from_document(doc)?);
        }

        let user = User {
            id: identity.uid.clone(),
            name: identity
                .display_name
                .clone()
                .unwrap_or_else(|| "User".to_string()),
            email: identity.email.clone(),
            role: UserRole::Viewer,
            credits: 0,
            avatar_url: None,
            password: None,
            created_at: Some(Utc::now()),
        };
        let doc = to_document(&user)?;
        self.adapter
            .put(collections::USERS, &doc.id, doc.fields)
            .await?;
        debug!("👤 Created missing profile for {}", identity.email);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        let identity = self.auth.sign_in(email, password).await?;
        let user = self.resolve_profile(&identity).await?;
        self.set_identity(Some(user.clone()));
        Ok(user)
    }

    /// Authenticate (or provision) the reserved administrative identity and
    /// force-upsert its profile to Admin with the sentinel credit balance.
    pub async fn login_as_admin(&self) -> Result<User, StoreError> {
        let identity = match self.auth.sign_in(ADMIN_EMAIL, ADMIN_SECRET).await {
            Ok(identity) => identity,
            Err(StoreError::AuthFailed(_)) | Err(StoreError::NotFound(_)) => {
                info!("🔑 Admin account absent, provisioning...");
                self.auth
                    .sign_up(ADMIN_NAME, ADMIN_EMAIL, ADMIN_SECRET)
                    .await?
            }
            Err(e) => return Err(e),
        };

        let admin = User {
            id: identity.uid.clone(),
            name: ADMIN_NAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: UserRole::Admin,
            credits: ADMIN_CREDITS,
            avatar_url: None,
            password: None,
            created_at: Some(Utc::now()),
        };
        let doc = to_document(&admin)?;
        self.adapter
            .put(collections::USERS, &doc.id, doc.fields)
            .await?;
        self.set_identity(Some(admin.clone()));
        Ok(admin)
    }

    /// Register a viewer or creator account. Creators start with 10 credits.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, StoreError> {
        if role == UserRole::Admin {
            return Err(StoreError::InvalidInput(
                "admin accounts cannot be self-registered".to_string(),
            ));
        }

        let identity = self.auth.sign_up(name, email, password).await?;
        let user = User {
            id: identity.uid,
            name: name.to_string(),
            email: email.to_string(),
            role,
            credits: if role == UserRole::Creator { 10 } else { 0 },
            avatar_url: None,
            password: None,
            created_at: Some(Utc::now()),
        };
        let doc = to_document(&user)?;
        self.adapter
            .put(collections::USERS, &doc.id, doc.fields)
            .await?;
        self.set_identity(Some(user.clone()));
        Ok(user)
    }

    pub async fn logout(&self) {
        self.auth.sign_out().await;
        self.set_identity(None);
    }

    // --- Movies ---------------------------------------------------------

    /// All movies, minus permanently retired titles. The filter is applied
    /// on every read; the underlying records are never deleted.
    pub async fn get_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let docs = self.adapter.list(collections::MOVIES).await?;
        let mut movies = Vec::with_capacity(docs.len());
        for doc in docs {
            let movie: Movie = from_document(doc)?;
            if RETIRED_TITLES.contains(&movie.title.as_str()) {
                continue;
            }
            movies.push(movie);
        }
        Ok(movies)
    }

    /// Viewer-facing listing: approved movies only.
    pub async fn get_approved_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let mut movies = self.get_movies().await?;
        movies.retain(|m| m.status == MovieStatus::Approved);
        Ok(movies)
    }

    /// Creator-facing listing: all of the creator's own movies, any status.
    pub async fn get_movies_by_creator(&self, creator_id: &str) -> Result<Vec<Movie>, StoreError> {
        let mut movies = self.get_movies().await?;
        movies.retain(|m| m.creator_id == creator_id);
        Ok(movies)
    }

    pub async fn get_movie(&self, id: &str) -> Result<Option<Movie>, StoreError> {
        match self.adapter.get(collections::MOVIES, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn add_movie(&self, movie: &Movie) -> Result<(), StoreError> {
        let doc = to_document(movie)?;
        self.adapter
            .put(collections::MOVIES, &doc.id, doc.fields)
            .await?;
        Ok(())
    }

    pub async fn update_movie(&self, movie: &Movie) -> Result<(), StoreError> {
        let doc = to_document(movie)?;
        self.adapter
            .patch(collections::MOVIES, &doc.id, doc.fields)
            .await
            .map_err(|e| not_found_or(e, format!("movie {}", movie.id)))
    }

    /// Bump the view counter of an approved movie being watched.
    pub async fn record_view(&self, id: &str) -> Result<Movie, StoreError> {
        let mut movie = self
            .get_movie(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))?;
        movie.views += 1;
        self.adapter
            .patch(collections::MOVIES, id, partial(&[("views", json!(movie.views))]))
            .await
            .map_err(|e| not_found_or(e, format!("movie {id}")))?;
        Ok(movie)
    }

    /// Remove a movie and every moderation request referencing it, as one
    /// atomic unit. A failed transaction leaves both untouched.
    pub async fn delete_movie(&self, id: &str) -> Result<(), StoreError> {
        cascade::delete_movie(self.adapter.as_ref(), id)
            .await
            .map_err(StoreError::PersistenceFailed)
    }

    // --- Creator flows --------------------------------------------------

    /// Credit-gated upload: debit the upload cost, persist the pending
    /// movie and its moderation request. An unaffordable submission fails
    /// before anything is written.
    pub async fn submit_upload(
        &self,
        user: &User,
        draft: MovieDraft,
    ) -> Result<UploadOutcome, StoreError> {
        draft.validate()?;

        let debited = ledger::debit(user, ledger::cost_of(RequestAction::Upload))?;
        self.update_user(&debited).await?;

        let movie = Movie::from_draft(draft, &debited);
        let request = ModerationRequest::for_upload(&movie);
        self.add_movie(&movie).await?;
        self.add_request(&request).await?;

        info!(
            "🎬 Upload submitted: '{}' by {} ({} credits left)",
            movie.title, debited.name, debited.credits
        );
        Ok(UploadOutcome {
            user: debited,
            movie,
            request,
        })
    }

    /// Credit-gated deletion. Creators pay the delete cost; admins delete
    /// for free. Returns the (possibly debited) user value.
    pub async fn submit_delete(&self, user: &User, movie_id: &str) -> Result<User, StoreError> {
        let updated = if user.role == UserRole::Creator {
            let debited =
                ledger::debit(user, ledger::cost_of(RequestAction::Delete))?;
            self.update_user(&debited).await?;
            debited
        } else {
            user.clone()
        };
        self.delete_movie(movie_id).await?;
        Ok(updated)
    }

    /// Apply an externally verified engagement reward to a user's balance.
    pub async fn grant_credits(&self, user: &User, amount: u32) -> Result<User, StoreError> {
        let credited = ledger::credit(user, amount);
        self.update_user(&credited).await?;
        Ok(credited)
    }

    // --- Moderation -----------------------------------------------------

    pub async fn approve_request(&self, id: &str) -> Result<ModerationRequest, StoreError> {
        self.resolve_request(id, Decision::Approve).await
    }

    pub async fn reject_request(&self, id: &str) -> Result<ModerationRequest, StoreError> {
        self.resolve_request(id, Decision::Reject).await
    }

    async fn resolve_request(
        &self,
        id: &str,
        decision: Decision,
    ) -> Result<ModerationRequest, StoreError> {
        let doc = self
            .adapter
            .get(collections::REQUESTS, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        let request: ModerationRequest = from_document(doc)?;

        let Some(resolution) = moderation::resolve(&request, decision) else {
            // Terminal already; do not re-fire side effects.
            debug!("Request {} already resolved, ignoring {:?}", id, decision);
            return Ok(request);
        };

        self.update_request(&resolution.request).await?;

        if let Some(status) = resolution.movie_status {
            match self.get_movie(&request.movie_id).await? {
                Some(mut movie) => {
                    movie.status = status;
                    self.update_movie(&movie).await?;
                }
                // The movie may have been deleted while the request sat in
                // the queue; the request still transitions.
                None => debug!(
                    "Request {} references missing movie {}, skipping status update",
                    id, request.movie_id
                ),
            }
        }

        info!("⚖️  Request {} resolved: {:?}", id, decision);
        Ok(resolution.request)
    }

    // --- Categories -----------------------------------------------------

    /// Read-path graceful degradation: a failing or empty backend yields
    /// the seeded defaults instead of an error.
    pub async fn get_categories(&self) -> Result<Vec<Category>, StoreError> {
        match self.adapter.list(collections::CATEGORIES).await {
            Ok(docs) if !docs.is_empty() => {
                let mut categories = Vec::with_capacity(docs.len());
                for doc in docs {
                    categories.push(from_document(doc)?);
                }
                Ok(categories)
            }
            Ok(_) => Ok(default_categories()),
            Err(e) => {
                warn!("Failed to fetch categories, using defaults: {}", e);
                Ok(default_categories())
            }
        }
    }

    // --- Users ----------------------------------------------------------

    pub async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        let docs = self.adapter.list(collections::USERS).await?;
        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            users.push(from_document(doc)?);
        }
        Ok(users)
    }

    /// Persist a user profile. The legacy plaintext `password` field is
    /// stripped unconditionally before the write reaches the adapter.
    pub async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut doc = to_document(user)?;
        doc.fields.remove("password");
        self.adapter
            .patch(collections::USERS, &doc.id, doc.fields)
            .await
            .map_err(|e| not_found_or(e, format!("user {}", user.id)))?;
        self.refresh_identity(user);
        Ok(())
    }

    // --- Requests -------------------------------------------------------

    pub async fn get_requests(&self) -> Result<Vec<ModerationRequest>, StoreError> {
        let docs = self.adapter.list(collections::REQUESTS).await?;
        let mut requests = Vec::with_capacity(docs.len());
        for doc in docs {
            requests.push(from_document(doc)?);
        }
        Ok(requests)
    }

    pub async fn add_request(&self, request: &ModerationRequest) -> Result<(), StoreError> {
        let doc = to_document(request)?;
        self.adapter
            .put(collections::REQUESTS, &doc.id, doc.fields)
            .await?;
        Ok(())
    }

    pub async fn update_request(&self, request: &ModerationRequest) -> Result<(), StoreError> {
        let doc = to_document(request)?;
        self.adapter
            .patch(collections::REQUESTS, &doc.id, doc.fields)
            .await
            .map_err(|e| not_found_or(e, format!("request {}", request.id)))
    }

    // --- Settings -------------------------------------------------------

    /// Singleton settings, degrading to the default on any read failure.
    pub async fn get_settings(&self) -> AppSettings {
        match self.adapter.get(collections::SETTINGS, SETTINGS_DOC_ID).await {
            Ok(Some(doc)) => from_document(doc).unwrap_or_default(),
            Ok(None) => AppSettings::default(),
            Err(e) => {
                warn!("Failed to fetch settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Wholesale overwrite; there is no partial settings patch.
    pub async fn update_settings(&self, settings: &AppSettings) -> Result<(), StoreError> {
        let fields = match serde_json::to_value(settings).map_err(BackendError::Serde)? {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("settings serialize to an object"),
        };
        self.adapter
            .put(collections::SETTINGS, SETTINGS_DOC_ID, fields)
            .await?;
        Ok(())
    }
}

fn not_found_or(err: BackendError, what: String) -> StoreError {
    match err {
        BackendError::NotFound { .. } => StoreError::NotFound(what),
        other => StoreError::PersistenceFailed(other),
    }
}
