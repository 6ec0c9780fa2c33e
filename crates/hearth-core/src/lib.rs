//! Core runtime for Hearth: cursor-paginated connections over an entity
//! store, batched entity hydration, and access-scoped search conditions.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod key;
pub mod obs;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            access::Account,
            connection::{ConnectionTarget, PaginationArgs, SortKey},
            cursor::Cursor,
            direction::Direction,
            predicate::Predicate,
        },
        key::Key,
        value::Value,
    };
}
