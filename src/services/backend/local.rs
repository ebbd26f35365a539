use super::{BackendAdapter, Document, WriteOp};
use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Single-process fallback store. One JSON file per collection under the
/// data directory, each holding the full ordered sequence of that
/// collection's entities. Writes go to disk before the call returns.
///
/// Internally synchronous behind a mutex; exposed through the async
/// [`BackendAdapter`] contract for parity with the remote store.
pub struct LocalAdapter {
    data_dir: PathBuf,
    /// Default datasets persisted on first read of an absent collection.
    seed: HashMap<String, Vec<Document>>,
    cache: Mutex<HashMap<String, Vec<Document>>>,
}

impl LocalAdapter {
    pub async fn new(
        data_dir: impl Into<PathBuf>,
        seed: HashMap<String, Vec<Document>>,
    ) -> Result<Self, BackendError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;
        info!("📂 Local store: {}", data_dir.display());
        Ok(Self {
            data_dir,
            seed,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    /// Load a collection into the cache, seeding and persisting the default
    /// dataset on first access so subsequent reads are stable.
    async fn load_into<'a>(
        &self,
        cache: &'a mut HashMap<String, Vec<Document>>,
        collection: &str,
    ) -> Result<&'a mut Vec<Document>, BackendError> {
        if !cache.contains_key(collection) {
            let path = self.collection_path(collection);
            let docs = if path.exists() {
                let raw = tokio::fs::read(&path).await?;
                decode_collection(&raw)?
            } else if let Some(seeded) = self.seed.get(collection) {
                debug!("🌱 Seeding local collection '{}'", collection);
                write_collection(&path, seeded).await?;
                seeded.clone()
            } else {
                Vec::new()
            };
            cache.insert(collection.to_string(), docs);
        }
        Ok(cache.get_mut(collection).expect("collection just loaded"))
    }

    async fn persist(&self, collection: &str, docs: &[Document]) -> Result<(), BackendError> {
        write_collection(&self.collection_path(collection), docs).await
    }
}

/// On disk every entity is a flat object with its id inlined.
fn decode_collection(raw: &[u8]) -> Result<Vec<Document>, BackendError> {
    let values: Vec<Map<String, Value>> = serde_json::from_slice(raw)?;
    let mut docs = Vec::with_capacity(values.len());
    for mut fields in values {
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => continue, // skip malformed rows
        };
        docs.push(Document { id, fields });
    }
    Ok(docs)
}

fn encode_collection(docs: &[Document]) -> Result<Vec<u8>, BackendError> {
    let values: Vec<Value> = docs
        .iter()
        .map(|doc| {
            let mut fields = doc.fields.clone();
            fields.insert("id".to_string(), Value::String(doc.id.clone()));
            Value::Object(fields)
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&values)?)
}

async fn write_collection(path: &Path, docs: &[Document]) -> Result<(), BackendError> {
    // Write-to-temp + rename so a crash mid-write never truncates the
    // collection file.
    let raw = encode_collection(docs)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, raw).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn apply_op(cache: &mut HashMap<String, Vec<Document>>, op: &WriteOp) {
    match op {
        WriteOp::Put {
            collection,
            id,
            fields,
        } => {
            let docs = cache.entry(collection.clone()).or_default();
            match docs.iter_mut().find(|d| d.id == *id) {
                Some(doc) => doc.fields = fields.clone(),
                None => docs.push(Document {
                    id: id.clone(),
                    fields: fields.clone(),
                }),
            }
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = cache.get_mut(collection) {
                docs.retain(|d| d.id != *id);
            }
        }
    }
}

#[async_trait]
impl BackendAdapter for LocalAdapter {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, BackendError> {
        let mut cache = self.cache.lock().await;
        Ok(self.load_into(&mut cache, collection).await?.clone())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        let mut cache = self.cache.lock().await;
        let docs = self.load_into(&mut cache, collection).await?;
        Ok(docs.iter().find(|d| d.id == id).cloned())
    }

    // Every write mutates a staged copy, persists it, and only then swaps
    // it into the cache. A failed disk write must never surface through a
    // later read.

    async fn put(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().await;
        let mut docs = self.load_into(&mut cache, collection).await?.clone();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(Document {
                id: id.to_string(),
                fields,
            }),
        }
        self.persist(collection, &docs).await?;
        cache.insert(collection.to_string(), docs);
        Ok(())
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().await;
        let mut docs = self.load_into(&mut cache, collection).await?.clone();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| BackendError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        self.persist(collection, &docs).await?;
        cache.insert(collection.to_string(), docs);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().await;
        let mut docs = self.load_into(&mut cache, collection).await?.clone();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            // Deleting a nonexistent id is a successful no-op.
            return Ok(());
        }
        self.persist(collection, &docs).await?;
        cache.insert(collection.to_string(), docs);
        Ok(())
    }

    async fn delete_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().await;
        let mut docs = self.load_into(&mut cache, collection).await?.clone();
        let before = docs.len();
        docs.retain(|d| d.fields.get(field) != Some(value));
        if docs.len() == before {
            return Ok(());
        }
        self.persist(collection, &docs).await?;
        cache.insert(collection.to_string(), docs);
        Ok(())
    }

    async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().await;

        // Make sure every touched collection is loaded, then apply the batch
        // against a staged copy. Nothing becomes visible until every file is
        // in place.
        let mut touched: Vec<String> = Vec::new();
        for op in &ops {
            let collection = match op {
                WriteOp::Put { collection, .. } | WriteOp::Delete { collection, .. } => collection,
            };
            if !touched.iter().any(|c| c == collection) {
                self.load_into(&mut cache, collection).await?;
                touched.push(collection.clone());
            }
        }

        let mut staged = cache.clone();
        for op in &ops {
            apply_op(&mut staged, op);
        }

        // Two-phase file commit: every collection is written to its temp
        // file before the first rename, so an I/O failure while staging
        // leaves all the live files as they were.
        let mut pending: Vec<(PathBuf, PathBuf)> = Vec::new();
        for collection in &touched {
            let docs = staged.get(collection).cloned().unwrap_or_default();
            let raw = encode_collection(&docs)?;
            let path = self.collection_path(collection);
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, raw).await?;
            pending.push((tmp, path));
        }
        for (tmp, path) in pending {
            tokio::fs::rename(&tmp, &path).await?;
        }

        *cache = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::partial;
    use serde_json::json;

    fn doc(id: &str, title: &str) -> Document {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        Document {
            id: id.to_string(),
            fields,
        }
    }

    async fn adapter(dir: &Path) -> LocalAdapter {
        LocalAdapter::new(dir, HashMap::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;

        let d = doc("m1", "Inception");
        store.put("movies", "m1", d.fields.clone()).await.unwrap();
        let got = store.get("movies", "m1").await.unwrap().unwrap();
        assert_eq!(got.fields["title"], json!("Inception"));

        store.delete("movies", "m1").await.unwrap();
        assert!(store.get("movies", "m1").await.unwrap().is_none());
        // Idempotent.
        store.delete("movies", "m1").await.unwrap();
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;
        let err = store
            .patch("movies", "ghost", partial(&[("title", json!("x"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_seed_persists_on_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut seed = HashMap::new();
        seed.insert("categories".to_string(), vec![doc("cat_1", "Action")]);

        let store = LocalAdapter::new(dir.path(), seed).await.unwrap();
        let listed = store.list("categories").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(dir.path().join("categories.json").exists());

        // A fresh adapter over the same directory sees the persisted seed
        // even without defaults configured.
        let store2 = adapter(dir.path()).await;
        assert_eq!(store2.list("categories").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_durability_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = adapter(dir.path()).await;
            store
                .put("movies", "m1", doc("m1", "Alien").fields)
                .await
                .unwrap();
        }
        let store = adapter(dir.path()).await;
        let got = store.get("movies", "m1").await.unwrap().unwrap();
        assert_eq!(got.fields["title"], json!("Alien"));
    }

    #[tokio::test]
    async fn test_delete_where_matches_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;
        for (id, movie) in [("r1", "m1"), ("r2", "m1"), ("r3", "m2")] {
            store
                .put("requests", id, partial(&[("movieId", json!(movie))]))
                .await
                .unwrap();
        }
        store
            .delete_where("requests", "movieId", &json!("m1"))
            .await
            .unwrap();
        let left = store.list("requests").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "r3");
    }

    #[tokio::test]
    async fn test_failed_write_not_visible_to_reads() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;
        store
            .put("movies", "m1", doc("m1", "Alien").fields)
            .await
            .unwrap();

        // Occupy the temp path with a directory so the next persist fails.
        tokio::fs::create_dir(dir.path().join("movies.json.tmp"))
            .await
            .unwrap();

        assert!(store
            .put("movies", "m2", doc("m2", "Ghost").fields)
            .await
            .is_err());
        assert!(store.get("movies", "m2").await.unwrap().is_none());

        assert!(store
            .patch("movies", "m1", partial(&[("title", json!("Aliens"))]))
            .await
            .is_err());
        assert!(store.delete("movies", "m1").await.is_err());

        let listed = store.list("movies").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].fields["title"], json!("Alien"));
    }

    #[tokio::test]
    async fn test_failed_transact_leaves_all_files_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;
        store
            .put("movies", "m1", doc("m1", "Alien").fields)
            .await
            .unwrap();
        store
            .put("requests", "r1", partial(&[("movieId", json!("m1"))]))
            .await
            .unwrap();

        // Staging the second collection fails, before any rename.
        tokio::fs::create_dir(dir.path().join("requests.json.tmp"))
            .await
            .unwrap();
        assert!(store
            .transact(vec![
                WriteOp::delete("movies", "m1"),
                WriteOp::delete("requests", "r1"),
            ])
            .await
            .is_err());

        assert!(store.get("movies", "m1").await.unwrap().is_some());
        assert!(store.get("requests", "r1").await.unwrap().is_some());

        // The live files were never touched either.
        let fresh = adapter(dir.path()).await;
        assert!(fresh.get("movies", "m1").await.unwrap().is_some());
        assert!(fresh.get("requests", "r1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_transact_applies_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = adapter(dir.path()).await;
        store
            .put("movies", "m1", doc("m1", "Alien").fields)
            .await
            .unwrap();
        store
            .put("requests", "r1", partial(&[("movieId", json!("m1"))]))
            .await
            .unwrap();

        store
            .transact(vec![
                WriteOp::delete("movies", "m1"),
                WriteOp::delete("requests", "r1"),
                WriteOp::put("movies", doc("m2", "Aliens")),
            ])
            .await
            .unwrap();

        assert!(store.get("movies", "m1").await.unwrap().is_none());
        assert!(store.get("requests", "r1").await.unwrap().is_none());
        assert!(store.get("movies", "m2").await.unwrap().is_some());
    }
}
