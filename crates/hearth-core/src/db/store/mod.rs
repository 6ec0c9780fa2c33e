//! Module: store
//! Responsibility: the entity storage contract consumed by connections.
//! Does not own: pagination, cursors, or search access policy.
//! Boundary: implemented by the host's storage layer; `MemoryStore` is the
//! in-process reference implementation.

mod memory;

pub use memory::{Document, ID_FIELD, MemoryStore, ViewPolicy};

use crate::{
    db::{
        access::Account,
        direction::Direction,
        predicate::{Predicate, Row},
    },
    error::InternalError,
    key::Key,
};
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("entity type '{0}' is not stored here")]
    UnknownEntityType(String),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        Self::store_internal(err.to_string())
    }
}

///
/// Entity
///
/// A loaded entity: readable by field name and identified by a key.
///

pub trait Entity: Row {
    fn key(&self) -> Key;
}

///
/// OrderTerm
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
}

impl OrderTerm {
    #[must_use]
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

///
/// EntityQuery
///
/// Filterable, orderable id query over one entity type. Executing it
/// returns ids only; hydration is a separate batched step.
///

#[derive(Clone, Debug)]
pub struct EntityQuery {
    entity_type: String,
    filter: Predicate,
    order: Vec<OrderTerm>,
    limit: Option<usize>,
    access_account: Option<Account>,
}

impl EntityQuery {
    #[must_use]
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            filter: Predicate::True,
            order: Vec::new(),
            limit: None,
            access_account: None,
        }
    }

    /// Conjoin an additional condition.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = std::mem::replace(&mut self.filter, Predicate::True).and_also(predicate);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderTerm::new(field, direction));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask the store to enforce entity-level view access for `account`.
    #[must_use]
    pub fn access_check(mut self, account: Account) -> Self {
        self.access_account = Some(account);
        self
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.filter
    }

    #[must_use]
    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    #[must_use]
    pub const fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub const fn access_account(&self) -> Option<&Account> {
        self.access_account.as_ref()
    }
}

///
/// EntityStore
///
/// Storage collaborator: run id queries and load entities in batches.
///

pub trait EntityStore {
    type Entity: Entity;

    /// Execute an id query, honouring filter, order, limit, and access check.
    fn query_ids(&self, query: &EntityQuery) -> Result<Vec<Key>, StoreError>;

    /// Load entities by id. Unknown ids are skipped, not reported.
    fn load_multiple(&self, entity_type: &str, ids: &[Key])
    -> Result<Vec<Self::Entity>, StoreError>;
}
