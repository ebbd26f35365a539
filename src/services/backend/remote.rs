use super::{BackendAdapter, Document, WriteOp};
use crate::config::RemoteConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Networked multi-client document store. Every operation round-trips;
/// there is no local caching, and concurrent writers from other processes
/// are last-write-wins at the granularity the backend provides.
pub struct RemoteAdapter {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ListResponse {
    documents: Vec<Document>,
}

#[derive(Serialize)]
struct DeleteWhereRequest<'a> {
    field: &'a str,
    value: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum CommitWrite<'a> {
    Put {
        collection: &'a str,
        id: &'a str,
        fields: &'a Map<String, Value>,
    },
    Delete {
        collection: &'a str,
        id: &'a str,
    },
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    writes: Vec<CommitWrite<'a>>,
}

impl RemoteAdapter {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.as_str().trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/collections/{}/documents",
            self.endpoint, self.project_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn commit_url(&self) -> String {
        format!("{}/v1/projects/{}:commit", self.endpoint, self.project_id)
    }

    fn check(&self, response: Response) -> Result<Response, BackendError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(BackendError::Http {
                status: response.status().as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl BackendAdapter for RemoteAdapter {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, BackendError> {
        let response = self
            .client
            .get(self.collection_url(collection))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let body: ListResponse = self.check(response)?.json().await?;
        debug!("☁️  Listed {} documents from '{}'", body.documents.len(), collection);
        Ok(body.documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        let response = self
            .client
            .get(self.document_url(collection, id))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: Document = self.check(response)?.json().await?;
        Ok(Some(doc))
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.document_url(collection, id))
            .header("x-api-key", &self.api_key)
            .json(&fields)
            .send()
            .await?;
        self.check(response)?;
        Ok(())
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .patch(self.document_url(collection, id))
            .header("x-api-key", &self.api_key)
            .json(&fields)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        self.check(response)?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        // Deleting an absent document is a success.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.check(response)?;
        Ok(())
    }

    async fn delete_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), BackendError> {
        let url = format!("{}:deleteWhere", self.collection_url(collection));
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(&DeleteWhereRequest { field, value })
            .send()
            .await?;
        self.check(response)?;
        Ok(())
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), BackendError> {
        let writes: Vec<CommitWrite<'_>> = ops
            .iter()
            .map(|op| match op {
                WriteOp::Put {
                    collection,
                    id,
                    fields,
                } => CommitWrite::Put {
                    collection,
                    id,
                    fields,
                },
                WriteOp::Delete { collection, id } => CommitWrite::Delete { collection, id },
            })
            .collect();

        let response = self
            .client
            .post(self.commit_url())
            .header("x-api-key", &self.api_key)
            .json(&CommitRequest { writes })
            .send()
            .await?;

        if !response.status().is_success() {
            // The backend applies a commit atomically; any non-success
            // status means none of the writes took effect.
            return Err(BackendError::TxAborted(format!(
                "commit rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn adapter() -> RemoteAdapter {
        RemoteAdapter::new(&RemoteConfig {
            endpoint: Url::parse("https://store.flimlix.app/").unwrap(),
            project_id: "flimlix".to_string(),
            api_key: "key".to_string(),
        })
    }

    #[test]
    fn test_url_shapes() {
        let remote = adapter();
        assert_eq!(
            remote.collection_url("movies"),
            "https://store.flimlix.app/v1/projects/flimlix/collections/movies/documents"
        );
        assert_eq!(
            remote.document_url("movies", "m1"),
            "https://store.flimlix.app/v1/projects/flimlix/collections/movies/documents/m1"
        );
        assert_eq!(
            remote.commit_url(),
            "https://store.flimlix.app/v1/projects/flimlix:commit"
        );
    }

    #[test]
    fn test_commit_write_shape() {
        let fields = Map::new();
        let write = CommitWrite::Put {
            collection: "movies",
            id: "m1",
            fields: &fields,
        };
        let json = serde_json::to_value(&write).unwrap();
        assert_eq!(json["put"]["collection"], "movies");
        assert_eq!(json["put"]["id"], "m1");
    }
}
