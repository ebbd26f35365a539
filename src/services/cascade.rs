use crate::error::BackendError;
use crate::services::backend::{collections, BackendAdapter, Document, WriteOp};
use serde_json::Value;
use tracing::info;

/// The atomic operation set for removing a movie: the movie document plus
/// every moderation request referencing it.
#[derive(Debug)]
pub struct CascadePlan {
    pub movie_id: String,
    pub request_ids: Vec<String>,
}

impl CascadePlan {
    /// Select the requests whose `movie_id` points at the movie being
    /// removed. Exposed separately so atomicity tests can build plans
    /// against fixed document sets.
    pub fn build(movie_id: &str, requests: &[Document]) -> Self {
        let request_ids = requests
            .iter()
            .filter(|doc| doc.fields.get("movie_id") == Some(&Value::String(movie_id.to_string())))
            .map(|doc| doc.id.clone())
            .collect();
        Self {
            movie_id: movie_id.to_string(),
            request_ids,
        }
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        let mut ops = vec![WriteOp::delete(collections::MOVIES, &self.movie_id)];
        for request_id in &self.request_ids {
            ops.push(WriteOp::delete(collections::REQUESTS, request_id));
        }
        ops
    }
}

/// Delete a movie together with all requests referencing it, as one
/// transaction. On success no request with this `movie_id` is readable
/// afterwards; on failure both the movie and its requests are untouched.
pub async fn delete_movie(
    adapter: &dyn BackendAdapter,
    movie_id: &str,
) -> Result<(), BackendError> {
    let requests = adapter.list(collections::REQUESTS).await?;
    let plan = CascadePlan::build(movie_id, &requests);
    info!(
        "🗑️  Cascade delete: movie {} with {} referencing request(s)",
        movie_id,
        plan.request_ids.len()
    );
    adapter.transact(plan.into_ops()).await
}
