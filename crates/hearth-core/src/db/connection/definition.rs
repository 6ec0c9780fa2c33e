use crate::{
    config::ConnectionConfig,
    db::{connection::ConnectionError, predicate::Predicate, store::ID_FIELD},
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// SortKey
///
/// Logical sort criterion exposed to clients (e.g. `CREATED_AT`). Mapped to
/// a stored field per connection.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SortKey(String);

impl SortKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SortKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

///
/// ConnectionTarget
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectionTarget {
    /// Top-level collection.
    Root,
    /// Children of one parent entity (e.g. comments of node X).
    Parent(Key),
}

///
/// ConnectionDefinition
///
/// Static description of one paginated collection: what it lists, which
/// sort keys it accepts, and how it is scoped.
///

#[derive(Clone, Debug)]
pub struct ConnectionDefinition {
    name: String,
    entity_type: String,
    id_field: String,
    parent_field: Option<String>,
    base_filter: Predicate,
    sorts: BTreeMap<SortKey, String>,
    access_check: bool,
}

impl ConnectionDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            id_field: ID_FIELD.to_string(),
            parent_field: None,
            base_filter: Predicate::True,
            sorts: BTreeMap::new(),
            access_check: true,
        }
    }

    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut definition = Self::new(config.name.as_str(), config.entity_type.as_str())
            .access_check(config.access_check);

        if let Some(field) = &config.parent_field {
            definition = definition.parent_field(field.as_str());
        }
        for (key, field) in &config.sorts {
            definition = definition.sort(key.as_str(), field.as_str());
        }
        for (field, scalar) in &config.conditions {
            definition = definition.filter(Predicate::eq(field.as_str(), Value::from(scalar)));
        }

        definition
    }

    #[must_use]
    pub fn sort(mut self, key: impl Into<SortKey>, field: impl Into<String>) -> Self {
        self.sorts.insert(key.into(), field.into());
        self
    }

    #[must_use]
    pub fn parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.base_filter =
            std::mem::replace(&mut self.base_filter, Predicate::True).and_also(predicate);
        self
    }

    #[must_use]
    pub const fn access_check(mut self, enabled: bool) -> Self {
        self.access_check = enabled;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub fn id_field_name(&self) -> &str {
        &self.id_field
    }

    #[must_use]
    pub fn parent_field_name(&self) -> Option<&str> {
        self.parent_field.as_deref()
    }

    #[must_use]
    pub const fn base_filter(&self) -> &Predicate {
        &self.base_filter
    }

    #[must_use]
    pub const fn checks_access(&self) -> bool {
        self.access_check
    }

    /// Map a logical sort key to its stored field.
    pub fn sort_field(&self, key: &SortKey) -> Result<&str, ConnectionError> {
        self.sorts
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConnectionError::UnsupportedSortKey {
                connection: self.name.clone(),
                sort_key: key.to_string(),
            })
    }
}

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("connection '{0}' already registered")]
    ConnectionAlreadyRegistered(String),
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::ConnectionNotFound(_) => ErrorClass::Unsupported,
            Self::ConnectionAlreadyRegistered(_) => ErrorClass::InvariantViolation,
        }
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Connection, err.to_string())
    }
}

///
/// ConnectionRegistry
///
/// Name -> definition map, populated explicitly at startup.
///

#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    definitions: BTreeMap<String, ConnectionDefinition>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(configs: &[ConnectionConfig]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(ConnectionDefinition::from_config(config))?;
        }

        Ok(registry)
    }

    pub fn register(&mut self, definition: ConnectionDefinition) -> Result<(), RegistryError> {
        if self.definitions.contains_key(definition.name()) {
            return Err(RegistryError::ConnectionAlreadyRegistered(
                definition.name().to_string(),
            ));
        }

        self.definitions
            .insert(definition.name().to_string(), definition);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ConnectionDefinition, RegistryError> {
        self.definitions
            .get(name)
            .ok_or_else(|| RegistryError::ConnectionNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
