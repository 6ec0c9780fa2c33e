//! Module: config
//! Responsibility: TOML configuration for pagination limits, the content
//! access filter, and connection definitions.
//! Does not own: runtime registries (built from this by their owners).

use crate::{error::InternalError, value::Value};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_input(err.to_string())
    }
}

///
/// HearthConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HearthConfig {
    pub pagination: PaginationConfig,
    pub access: AccessConfig,
    pub connections: Vec<ConnectionConfig>,
}

impl HearthConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pagination.validate()?;
        self.access.validate()?;

        let mut names = BTreeSet::new();
        for connection in &self.connections {
            connection.validate()?;
            if !names.insert(connection.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "connection '{}' is defined more than once",
                    connection.name
                )));
            }
        }

        Ok(())
    }
}

///
/// PaginationConfig
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl PaginationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "pagination.max_page_size must be positive".to_string(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "pagination.default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }

        Ok(())
    }
}

///
/// AccessConfig
///
/// Index field names and the bundles the content access filter knows.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub bundle_field: String,
    pub status_field: String,
    pub author_field: String,
    pub visibility_field: String,
    pub group_field: String,
    /// Visibility values that membership in the content's group unlocks.
    pub membership_visibility: Vec<String>,
    pub bundles: Vec<BundleConfig>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            bundle_field: "type".to_string(),
            status_field: "status".to_string(),
            author_field: "uid".to_string(),
            visibility_field: "field_content_visibility".to_string(),
            group_field: "groups".to_string(),
            membership_visibility: vec!["group".to_string()],
            bundles: Vec::new(),
        }
    }
}

impl AccessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in [
            ("bundle_field", &self.bundle_field),
            ("status_field", &self.status_field),
            ("author_field", &self.author_field),
            ("visibility_field", &self.visibility_field),
            ("group_field", &self.group_field),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "access.{label} must not be empty"
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for bundle in &self.bundles {
            if bundle.bundle.trim().is_empty() || bundle.entity_type.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "access.bundles entries need an entity_type and a bundle".to_string(),
                ));
            }
            if !seen.insert((bundle.entity_type.as_str(), bundle.bundle.as_str())) {
                return Err(ConfigError::Invalid(format!(
                    "bundle '{}.{}' is listed more than once",
                    bundle.entity_type, bundle.bundle
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn is_membership_visibility(&self, value: &str) -> bool {
        self.membership_visibility.iter().any(|v| v == value)
    }
}

///
/// BundleConfig
///
/// An empty `visibility` list means the bundle has no visibility field.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    pub bundle: String,
    #[serde(default)]
    pub visibility: Vec<String>,
}

fn default_entity_type() -> String {
    "node".to_string()
}

///
/// ConnectionConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub parent_field: Option<String>,
    /// Logical sort key -> stored field.
    pub sorts: BTreeMap<String, String>,
    /// Fixed equality conditions every page of this connection carries.
    #[serde(default)]
    pub conditions: BTreeMap<String, ConfigScalar>,
    #[serde(default = "default_true")]
    pub access_check: bool,
}

const fn default_true() -> bool {
    true
}

impl ConnectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() || self.entity_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "connections need a name and an entity_type".to_string(),
            ));
        }
        if self.sorts.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "connection '{}' declares no sort keys",
                self.name
            )));
        }
        if let Some((key, _)) = self.sorts.iter().find(|(_, field)| field.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "connection '{}' maps sort key '{key}' to an empty field",
                self.name
            )));
        }

        Ok(())
    }
}

///
/// ConfigScalar
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigScalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&ConfigScalar> for Value {
    fn from(scalar: &ConfigScalar) -> Self {
        match scalar {
            ConfigScalar::Bool(v) => Self::Bool(*v),
            ConfigScalar::Int(v) => Self::Int(*v),
            ConfigScalar::Text(v) => Self::Text(v.clone()),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[pagination]
default_page_size = 20
max_page_size = 50

[access]
membership_visibility = ["group", "secret"]

[[access.bundles]]
bundle = "topic"
visibility = ["public", "community", "group"]

[[access.bundles]]
entity_type = "node"
bundle = "page"

[[connections]]
name = "node_comments"
entity_type = "comment"
parent_field = "entity_id"
sorts = { CREATED_AT = "created" }

[[connections]]
name = "events"
entity_type = "node"
sorts = { CREATED_AT = "created", TITLE = "title" }
conditions = { type = "event", status = 1 }
access_check = false
"#;

    #[test]
    fn empty_document_yields_defaults() {
        let config = HearthConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, HearthConfig::default());
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.access.visibility_field, "field_content_visibility");
    }

    #[test]
    fn sample_document_parses() {
        let config = HearthConfig::from_toml_str(SAMPLE).expect("sample config");

        assert_eq!(config.pagination.max_page_size, 50);
        assert_eq!(config.access.bundles.len(), 2);
        assert_eq!(config.access.bundles[0].entity_type, "node");
        assert!(config.access.bundles[1].visibility.is_empty());
        assert!(config.access.is_membership_visibility("secret"));

        let comments = &config.connections[0];
        assert_eq!(comments.parent_field.as_deref(), Some("entity_id"));
        assert!(comments.access_check);

        let events = &config.connections[1];
        assert!(!events.access_check);
        assert_eq!(
            Value::from(&events.conditions["status"]),
            Value::Int(1)
        );
        assert_eq!(
            Value::from(&events.conditions["type"]),
            Value::Text("event".to_string())
        );
    }

    #[test]
    fn validation_rejects_inconsistent_page_sizes() {
        let err = HearthConfig::from_toml_str(
            "[pagination]\ndefault_page_size = 200\nmax_page_size = 100\n",
        )
        .expect_err("default above max");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = HearthConfig::from_toml_str("[pagination]\nmax_page_size = 0\n")
            .expect_err("zero max");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validation_rejects_duplicate_connections_and_missing_sorts() {
        let dup = r#"
[[connections]]
name = "a"
entity_type = "node"
sorts = { CREATED_AT = "created" }

[[connections]]
name = "a"
entity_type = "comment"
sorts = { CREATED_AT = "created" }
"#;
        assert!(matches!(
            HearthConfig::from_toml_str(dup),
            Err(ConfigError::Invalid(_))
        ));

        let unsorted = r#"
[[connections]]
name = "a"
entity_type = "node"
sorts = {}
"#;
        assert!(matches!(
            HearthConfig::from_toml_str(unsorted),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        assert!(matches!(
            HearthConfig::from_toml_str("[pagination]\npage_size = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = HearthConfig::from_path("/nonexistent/hearth.toml").expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/hearth.toml"));
    }
}
