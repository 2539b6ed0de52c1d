//! MongoDB implementation of [`IndexStore`]
//!
//! Indexes are listed with the raw `listIndexes` cursor command rather than
//! `Collection::list_indexes`, so fields the driver's `IndexModel` does not
//! model survive into [`ExistingIndex::metadata`]. Creation goes through
//! `Collection::create_index`, which also generates default names.

use super::{IndexStore, StoreError};
use crate::config::ConnectionConfig;
use crate::models::{Collation, ExistingIndex, IndexSpec, KeyDirection, KeySequence};
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use std::time::Duration;

/// Server error code for a missing collection/database
const NAMESPACE_NOT_FOUND: i32 = 26;
/// Same key pattern already indexed under a different name or options
const INDEX_OPTIONS_CONFLICT: i32 = 85;
/// Same name already used for a different key pattern
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;

/// Index store backed by a MongoDB database
pub struct MongoIndexStore {
    database: Database,
    database_name: String,
}

impl MongoIndexStore {
    /// Wrap an already-connected database handle
    pub fn new(database: Database) -> Self {
        let database_name = database.name().to_string();
        Self {
            database,
            database_name,
        }
    }

    /// Connect using the URI, app name and timeouts from `config`
    ///
    /// The driver connects lazily: this only fails on an invalid URI or
    /// option set. Unreachable servers surface on the first list or create.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await?;
        options.app_name = Some(config.app_name.clone());
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));

        let client = Client::with_options(options)?;
        tracing::debug!(
            "Connected MongoDB client for database '{}' (app '{}')",
            config.database,
            config.app_name
        );
        Ok(Self::new(client.database(&config.database)))
    }
}

#[async_trait]
impl IndexStore for MongoIndexStore {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError> {
        let mut cursor = self
            .database
            .run_cursor_command(doc! { "listIndexes": collection })
            .await
            .map_err(|e| map_list_error(collection, e))?;

        let mut indexes = Vec::new();
        while cursor.advance().await? {
            let record = cursor.deserialize_current()?;
            indexes.push(existing_index_from_document(collection, record)?);
        }
        Ok(indexes)
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<String, StoreError> {
        let model = index_model_from_spec(spec)?;
        let result = self
            .database
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|e| map_create_error(spec, e))?;
        Ok(result.index_name)
    }
}

fn command_error_code(error: &mongodb::error::Error) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

fn map_list_error(collection: &str, error: mongodb::error::Error) -> StoreError {
    match command_error_code(&error) {
        Some(NAMESPACE_NOT_FOUND) => {
            StoreError::collection_unavailable(collection, "collection does not exist")
        }
        _ => StoreError::Driver(error),
    }
}

fn map_create_error(spec: &IndexSpec, error: mongodb::error::Error) -> StoreError {
    match command_error_code(&error) {
        Some(INDEX_OPTIONS_CONFLICT) | Some(INDEX_KEY_SPECS_CONFLICT) => {
            StoreError::index_conflict(spec.display_name(), error.to_string())
        }
        _ => StoreError::Driver(error),
    }
}

/// Convert one `listIndexes` record into an [`ExistingIndex`]
///
/// `name` and `key` are required; every other field is kept as relaxed
/// extended JSON in `metadata`.
pub(crate) fn existing_index_from_document(
    collection: &str,
    mut record: Document,
) -> Result<ExistingIndex, StoreError> {
    let name = match record.remove("name") {
        Some(Bson::String(name)) => name,
        _ => {
            return Err(StoreError::malformed_index(
                collection,
                "index record has no string 'name' field",
            ))
        }
    };

    let keys = match record.remove("key") {
        Some(Bson::Document(keys)) => key_sequence_from_document(collection, &name, keys)?,
        _ => {
            return Err(StoreError::malformed_index(
                collection,
                format!("index '{}' has no 'key' document", name),
            ))
        }
    };

    let metadata = record
        .into_iter()
        .map(|(field, value)| (field, value.into_relaxed_extjson()))
        .collect();

    Ok(ExistingIndex {
        name,
        keys,
        metadata,
    })
}

fn key_sequence_from_document(
    collection: &str,
    index_name: &str,
    keys: Document,
) -> Result<KeySequence, StoreError> {
    keys.into_iter()
        .map(|(field, value)| {
            let direction = match value {
                Bson::Int32(v) => KeyDirection::Int(v as i64),
                Bson::Int64(v) => KeyDirection::Int(v),
                Bson::Double(v) => KeyDirection::Double(v),
                Bson::String(v) => KeyDirection::Text(v),
                Bson::Decimal128(v) => v
                    .to_string()
                    .parse::<f64>()
                    .map(KeyDirection::Double)
                    .map_err(|_| {
                        StoreError::malformed_index(
                            collection,
                            format!("index '{}' field '{}' has direction {}", index_name, field, v),
                        )
                    })?,
                other => {
                    return Err(StoreError::malformed_index(
                        collection,
                        format!(
                            "index '{}' field '{}' has unsupported direction {}",
                            index_name, field, other
                        ),
                    ))
                }
            };
            Ok((field, direction))
        })
        .collect()
}

fn direction_to_bson(direction: &KeyDirection) -> Bson {
    match direction {
        KeyDirection::Int(v) => match i32::try_from(*v) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(*v),
        },
        KeyDirection::Double(v) => Bson::Double(*v),
        KeyDirection::Text(v) => Bson::String(v.clone()),
    }
}

/// Ordered key document, e.g. `{ item: 1, category: 1 }`
pub(crate) fn keys_document(keys: &KeySequence) -> Document {
    let mut document = Document::new();
    for key in keys {
        document.insert(key.field.clone(), direction_to_bson(&key.direction));
    }
    document
}

fn collation_options(collation: &Collation) -> Result<mongodb::options::Collation, StoreError> {
    let mut document = doc! { "locale": collation.locale.as_str() };
    if let Some(strength) = collation.strength {
        document.insert("strength", Bson::Int32(strength as i32));
    }
    if let Some(case_level) = collation.case_level {
        document.insert("caseLevel", case_level);
    }
    if let Some(numeric_ordering) = collation.numeric_ordering {
        document.insert("numericOrdering", numeric_ordering);
    }
    mongodb::bson::from_document(document)
        .map_err(|e| StoreError::encode(format!("invalid collation: {}", e)))
}

pub(crate) fn index_options_from_spec(spec: &IndexSpec) -> Result<IndexOptions, StoreError> {
    let desired = &spec.options;
    let mut options = IndexOptions::default();
    options.name = desired.name.clone();
    options.unique = desired.unique;
    options.sparse = desired.sparse;
    options.hidden = desired.hidden;
    options.expire_after = desired.expire_after_seconds.map(Duration::from_secs);

    if let Some(filter) = &desired.partial_filter_expression {
        let filter = mongodb::bson::to_document(filter)
            .map_err(|e| StoreError::encode(format!("invalid partial filter: {}", e)))?;
        options.partial_filter_expression = Some(filter);
    }
    if let Some(collation) = &desired.collation {
        options.collation = Some(collation_options(collation)?);
    }
    Ok(options)
}

fn index_model_from_spec(spec: &IndexSpec) -> Result<IndexModel, StoreError> {
    Ok(IndexModel::builder()
        .keys(keys_document(&spec.keys))
        .options(index_options_from_spec(spec)?)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexOptions as SpecOptions;
    use serde_json::json;

    #[test]
    fn test_existing_index_from_document() {
        let record = doc! {
            "v": 2,
            "key": { "item": 1, "category": 1.0 },
            "name": "item_1_category_1",
            "unique": true,
        };

        let index = existing_index_from_document("products", record).unwrap();

        assert_eq!(index.name, "item_1_category_1");
        let expected: KeySequence = [("item", 1), ("category", 1)].into_iter().collect();
        assert!(index.keys.matches(&expected));
        assert_eq!(index.metadata.get("v"), Some(&json!(2)));
        assert_eq!(index.metadata.get("unique"), Some(&json!(true)));
        assert!(!index.metadata.contains_key("name"));
        assert!(!index.metadata.contains_key("key"));
    }

    #[test]
    fn test_text_index_keys_are_kept() {
        let record = doc! {
            "key": { "_fts": "text", "_ftsx": 1 },
            "name": "body_text",
        };

        let index = existing_index_from_document("posts", record).unwrap();
        let fields: Vec<_> = index.keys.iter().map(|k| k.field.as_str()).collect();
        assert_eq!(fields, vec!["_fts", "_ftsx"]);
        assert!(!index.keys.iter().next().unwrap().direction.is_numeric());
    }

    #[test]
    fn test_record_without_name_is_malformed() {
        let record = doc! { "key": { "item": 1 } };
        let err = existing_index_from_document("products", record).unwrap_err();
        assert!(matches!(err, StoreError::MalformedIndex { .. }));
    }

    #[test]
    fn test_record_without_key_is_malformed() {
        let record = doc! { "name": "orphan" };
        let err = existing_index_from_document("products", record).unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn test_keys_document_preserves_order_and_width() {
        let keys: KeySequence = [("b", 1i64), ("a", -1i64), ("big", 1i64 << 40)]
            .into_iter()
            .collect();
        let document = keys_document(&keys);

        let fields: Vec<_> = document.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["b", "a", "big"]);
        assert_eq!(document.get("a"), Some(&Bson::Int32(-1)));
        assert_eq!(document.get("big"), Some(&Bson::Int64(1i64 << 40)));
    }

    #[test]
    fn test_index_options_from_spec() {
        let filter = json!({ "status": { "$eq": "active" } });
        let spec = IndexSpec::new([("email", 1)].into_iter().collect()).with_options(SpecOptions {
            name: Some("email_unique".to_string()),
            unique: Some(true),
            partial_filter_expression: filter.as_object().cloned(),
            expire_after_seconds: Some(3600),
            ..Default::default()
        });

        let options = index_options_from_spec(&spec).unwrap();

        assert_eq!(options.name.as_deref(), Some("email_unique"));
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(
            options.partial_filter_expression,
            Some(doc! { "status": { "$eq": "active" } })
        );
    }

    #[test]
    fn test_index_options_carry_collation_sparse_and_hidden() {
        let spec = IndexSpec::new([("sku", 1)].into_iter().collect()).with_options(SpecOptions {
            sparse: Some(true),
            hidden: Some(false),
            collation: Some(Collation {
                locale: "en".to_string(),
                strength: Some(2),
                case_level: Some(false),
                numeric_ordering: Some(true),
            }),
            ..Default::default()
        });

        let options = index_options_from_spec(&spec).unwrap();

        assert_eq!(options.sparse, Some(true));
        assert_eq!(options.hidden, Some(false));
        let collation = options.collation.unwrap();
        assert_eq!(collation.locale, "en");
        assert!(matches!(
            collation.strength,
            Some(mongodb::options::CollationStrength::Secondary)
        ));
        assert_eq!(collation.case_level, Some(false));
        assert_eq!(collation.numeric_ordering, Some(true));
    }
}
