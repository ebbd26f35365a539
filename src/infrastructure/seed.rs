use crate::models::{AppSettings, Category};
use crate::services::backend::{collections, to_document, Document};
use std::collections::HashMap;

/// Id of the singleton settings document in the `settings` collection.
pub const SETTINGS_DOC_ID: &str = "global";

pub fn default_categories() -> Vec<Category> {
    [
        ("cat_1", "Action"),
        ("cat_2", "Sci-Fi"),
        ("cat_3", "Drama"),
        ("cat_4", "Comedy"),
        ("cat_5", "Horror"),
    ]
    .into_iter()
    .map(|(id, name)| Category {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

/// Default datasets the local store persists on first read of an absent
/// collection. Remote mode never seeds; the remote backend owns its data.
pub fn default_seed() -> HashMap<String, Vec<Document>> {
    let mut seed = HashMap::new();

    let categories: Vec<Document> = default_categories()
        .iter()
        .map(|cat| to_document(cat).expect("category serializes"))
        .collect();
    seed.insert(collections::CATEGORIES.to_string(), categories);

    let settings = Document {
        id: SETTINGS_DOC_ID.to_string(),
        fields: match serde_json::to_value(AppSettings::default()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        },
    };
    seed.insert(collections::SETTINGS.to_string(), vec![settings]);

    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_covers_reference_collections() {
        let seed = default_seed();
        assert_eq!(seed[collections::CATEGORIES].len(), 5);
        assert_eq!(seed[collections::SETTINGS].len(), 1);
        assert_eq!(seed[collections::SETTINGS][0].id, SETTINGS_DOC_ID);
    }
}
