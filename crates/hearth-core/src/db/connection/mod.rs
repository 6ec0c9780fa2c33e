//! Module: connection
//! Responsibility: cursor-paginated collections ("connections") over the
//! entity store, with a strict total order and batched edge hydration.
//! Does not own: cursor wire format, entity storage, or search access.
//! Boundary: the host resolves `PaginationArgs` against a registered
//! `ConnectionDefinition`; everything else stays inside this module.
//!
//! Resolution is two-phase. `prepare` runs the id query and queues the
//! page's ids on a shared `EntityBuffer`; `finish` reads the loaded
//! entities back. Preparing several connections before finishing any of
//! them collapses their loads into one store call per entity type.

mod args;
mod definition;
mod helper;
mod page;

#[cfg(test)]
mod tests;

pub use args::{PageDirection, PageWindow, PaginationArgs};
pub use definition::{
    ConnectionDefinition, ConnectionRegistry, ConnectionTarget, RegistryError, SortKey,
};
pub use helper::{ConnectionQueryHelper, PageIds};
pub use page::{Connection, Edge, PageInfo, PendingConnection};

use crate::{db::store::StoreError, error::InternalError};
use thiserror::Error as ThisError;

///
/// ConnectionError
///

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("connection '{connection}' does not support sort key '{sort_key}'")]
    UnsupportedSortKey {
        connection: String,
        sort_key: String,
    },

    #[error("connection '{0}' lists children and requires a parent")]
    MissingParent(String),

    #[error("connection '{0}' has no parent relation")]
    UnexpectedParent(String),

    #[error("`first` and `last` cannot be combined")]
    FirstAndLast,

    #[error("`first` cannot be combined with `before`")]
    FirstWithBefore,

    #[error("`last` cannot be combined with `after`")]
    LastWithAfter,

    #[error("page size {requested} exceeds the maximum of {max}")]
    PageSizeExceeded { requested: u32, max: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ConnectionError> for InternalError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Store(inner) => inner.into(),
            ConnectionError::UnsupportedSortKey { .. } => {
                Self::connection_unsupported(err.to_string())
            }
            _ => Self::connection_input(err.to_string()),
        }
    }
}
