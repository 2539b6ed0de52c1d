//! Configuration for an index reconciliation run
//!
//! The desired indexes live in a JSON file next to the connection settings.
//! All fields except `connection.database` and `collections` have serde
//! defaults, so a minimal file only names the database and its collections.

use crate::models::CollectionIndexes;
use crate::services::{CreateFailurePolicy, IndexServiceError, ManagerSettings, Mode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_APP_NAME: &str = "indexsync";

/// How to reach the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection string
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the configured collections
    pub database: String,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// How long the driver waits for a suitable server
    #[serde(default = "default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,
}

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_server_selection_timeout_ms() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Full configuration of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSyncConfig {
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub mode: Mode,

    /// Classify only, never create
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub on_create_error: CreateFailurePolicy,

    /// Upper bound for the whole run, enforced by the caller
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    pub collections: Vec<CollectionIndexes>,
}

impl IndexSyncConfig {
    /// Read and validate a configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, IndexServiceError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| IndexServiceError::config_io(path, e))?;
        let config = Self::from_json(&contents)
            .map_err(|e| IndexServiceError::config_parse(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            mode: self.mode,
            dry_run: self.dry_run,
            on_create_error: self.on_create_error,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), IndexServiceError> {
        if self.connection.uri.trim().is_empty() {
            return Err(IndexServiceError::invalid_config("connection.uri cannot be empty"));
        }

        if self.connection.database.trim().is_empty() {
            return Err(IndexServiceError::invalid_config(
                "connection.database cannot be empty",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(IndexServiceError::invalid_config(
                "timeout_secs must be greater than 0",
            ));
        }

        let mut collection_names = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(IndexServiceError::invalid_config(
                    "collection name cannot be empty",
                ));
            }
            if !collection_names.insert(collection.name.as_str()) {
                return Err(IndexServiceError::invalid_config(format!(
                    "collection '{}' is configured more than once",
                    collection.name
                )));
            }
            validate_collection(collection)?;
        }

        Ok(())
    }
}

fn validate_collection(collection: &CollectionIndexes) -> Result<(), IndexServiceError> {
    let mut index_names = HashSet::new();

    for (position, spec) in collection.indexes.iter().enumerate() {
        let label = format!("{}.indexes[{}]", collection.name, position);

        if spec.keys.is_empty() {
            return Err(IndexServiceError::invalid_config(format!(
                "{}: an index needs at least one key",
                label
            )));
        }

        let mut fields = HashSet::new();
        for key in &spec.keys {
            if key.field.is_empty() {
                return Err(IndexServiceError::invalid_config(format!(
                    "{}: field name cannot be empty",
                    label
                )));
            }
            if !fields.insert(key.field.as_str()) {
                return Err(IndexServiceError::invalid_config(format!(
                    "{}: field '{}' appears twice",
                    label, key.field
                )));
            }
        }

        if let Some(name) = spec.name() {
            if name.is_empty() {
                return Err(IndexServiceError::invalid_config(format!(
                    "{}: explicit index name cannot be empty",
                    label
                )));
            }
            if !index_names.insert(name) {
                return Err(IndexServiceError::invalid_config(format!(
                    "{}: index name '{}' is declared twice",
                    label, name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "connection": { "database": "mim" },
            "collections": [{
                "name": "products",
                "indexes": [{
                    "keys": [
                        { "field": "item", "direction": 1 },
                        { "field": "category", "direction": 1 }
                    ],
                    "options": { "name": "item_1_category_1" }
                }]
            }]
        })
    }

    fn parse(value: serde_json::Value) -> IndexSyncConfig {
        IndexSyncConfig::from_json(&value.to_string()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(minimal());

        assert_eq!(config.connection.uri, "mongodb://localhost:27017");
        assert_eq!(config.connection.app_name, "indexsync");
        assert_eq!(config.connection.server_selection_timeout_ms, 10_000);
        assert_eq!(config.mode, Mode::Auto);
        assert!(!config.dry_run);
        assert_eq!(config.on_create_error, CreateFailurePolicy::Continue);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_modes_and_policies_parse() {
        let mut value = minimal();
        value["mode"] = json!("manual");
        value["on_create_error"] = json!("abort");
        let config = parse(value);

        assert_eq!(config.mode, Mode::Manual);
        assert_eq!(config.on_create_error, CreateFailurePolicy::Abort);
    }

    #[test]
    fn test_config_validation() {
        // Invalid: empty database
        let mut value = minimal();
        value["connection"]["database"] = json!("");
        assert!(parse(value).validate().is_err());

        // Invalid: index without keys
        let mut value = minimal();
        value["collections"][0]["indexes"][0]["keys"] = json!([]);
        assert!(parse(value).validate().is_err());

        // Invalid: repeated field within one index
        let mut value = minimal();
        value["collections"][0]["indexes"][0]["keys"] = json!([
            { "field": "item", "direction": 1 },
            { "field": "item", "direction": -1 }
        ]);
        assert!(parse(value).validate().is_err());

        // Invalid: duplicate collection
        let mut value = minimal();
        let collection = value["collections"][0].clone();
        value["collections"].as_array_mut().unwrap().push(collection);
        assert!(parse(value).validate().is_err());

        // Invalid: duplicate explicit name
        let mut value = minimal();
        let index = value["collections"][0]["indexes"][0].clone();
        value["collections"][0]["indexes"]
            .as_array_mut()
            .unwrap()
            .push(index);
        assert!(parse(value).validate().is_err());

        // Invalid: zero timeout
        let mut value = minimal();
        value["timeout_secs"] = json!(0);
        assert!(parse(value).validate().is_err());
    }

    #[test]
    fn test_partial_filter_must_be_object() {
        let mut value = minimal();
        value["collections"][0]["indexes"][0]["options"]["partial_filter_expression"] =
            json!("status = active");
        assert!(IndexSyncConfig::from_json(&value.to_string()).is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("indexes.json");
        std::fs::write(&path, minimal().to_string()).unwrap();

        let config = IndexSyncConfig::load(&path).await.unwrap();
        assert_eq!(config.collections.len(), 1);
        assert_eq!(config.collections[0].indexes[0].display_name(), "item_1_category_1");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = IndexSyncConfig::load(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexServiceError::ConfigIo { .. }));
    }
}
