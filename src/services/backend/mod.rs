pub mod local;
pub mod remote;

use crate::error::BackendError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};

pub use local::LocalAdapter;
pub use remote::RemoteAdapter;

/// Collection names shared by both adapters.
pub mod collections {
    pub const USERS: &str = "users";
    pub const MOVIES: &str = "movies";
    pub const REQUESTS: &str = "requests";
    pub const CATEGORIES: &str = "categories";
    pub const SETTINGS: &str = "settings";
}

/// A stored document: an id plus a flat JSON field map. The id is not
/// repeated inside `fields`; [`to_document`]/[`from_document`] move it
/// across the boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// One write inside a [`BackendAdapter::transact`] batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        collection: String,
        id: String,
        fields: Map<String, Value>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn put(collection: &str, doc: Document) -> Self {
        WriteOp::Put {
            collection: collection.to_string(),
            id: doc.id,
            fields: doc.fields,
        }
    }

    pub fn delete(collection: &str, id: &str) -> Self {
        WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Uniform CRUD over named collections, implemented by the remote
/// document store and the local fallback store. Selection between the two
/// happens once at boot; business logic only ever sees this trait.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// All documents of a collection. Ordering is backend-defined
    /// (insertion order for the local store).
    async fn list(&self, collection: &str) -> Result<Vec<Document>, BackendError>;

    /// Absent ids are an `Ok(None)`, not an error.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Full upsert, create-or-replace. Idempotent.
    async fn put(&self, collection: &str, id: &str, fields: Map<String, Value>)
        -> Result<(), BackendError>;

    /// Merge-update of existing fields. Fails with
    /// [`BackendError::NotFound`] if the id does not exist.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError>;

    /// Idempotent removal; deleting a nonexistent id succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    /// Batch delete of every document whose `field` equals `value`.
    async fn delete_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), BackendError>;

    /// Apply all operations as a single atomic unit, or none of them.
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), BackendError>;
}

/// Serialize an entity into a [`Document`], pulling its `id` field out of
/// the field map.
pub fn to_document<T: Serialize>(entity: &T) -> Result<Document, BackendError> {
    let value = serde_json::to_value(entity)?;
    let mut fields = match value {
        Value::Object(map) => map,
        other => {
            return Err(serde_json::Error::custom(format!("expected object, got {other}")).into())
        }
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) => id,
        _ => return Err(serde_json::Error::custom("entity has no string id field").into()),
    };
    Ok(Document { id, fields })
}

/// Deserialize a [`Document`] back into an entity, reattaching the id.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, BackendError> {
    let mut fields = doc.fields;
    fields.insert("id".to_string(), Value::String(doc.id));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Build a partial field map for `patch` calls.
pub fn partial(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, User, UserRole};

    #[test]
    fn test_document_round_trip() {
        let cat = Category {
            id: "cat_1".to_string(),
            name: "Action".to_string(),
        };
        let doc = to_document(&cat).unwrap();
        assert_eq!(doc.id, "cat_1");
        assert!(!doc.fields.contains_key("id"));
        let back: Category = from_document(doc).unwrap();
        assert_eq!(back, cat);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let user = User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: UserRole::Creator,
            credits: 10,
            avatar_url: None,
            password: None,
            created_at: None,
        };
        let doc = to_document(&user).unwrap();
        assert!(!doc.fields.contains_key("password"));
        assert!(!doc.fields.contains_key("avatar_url"));
    }
}
