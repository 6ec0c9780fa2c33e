//! Module: db
//! Responsibility: the query-side runtime: predicates, cursors, storage
//! contracts, batched loading, connections, search, and access filtering.
//! Does not own: configuration parsing or the metrics sink.
//! Boundary: every public entry point returns a module error that converts
//! into `InternalError` at the crate boundary.

pub mod access;
pub mod buffer;
pub mod connection;
pub mod cursor;
pub mod direction;
pub mod predicate;
pub mod search;
pub mod store;

use crate::{
    db::{
        connection::{ConnectionError, RegistryError},
        store::StoreError,
    },
    error::InternalError,
};
use thiserror::Error as ThisError;

///
/// DbError
///

#[derive(Debug, ThisError)]
pub enum DbError {
    #[error(transparent)]
    ConnectionError(#[from] ConnectionError),

    #[error(transparent)]
    RegistryError(#[from] RegistryError),

    #[error(transparent)]
    StoreError(#[from] StoreError),
}

impl From<DbError> for InternalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(e) => e.into(),
            DbError::RegistryError(e) => e.into(),
            DbError::StoreError(e) => e.into(),
        }
    }
}
