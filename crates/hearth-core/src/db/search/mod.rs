//! Module: search
//! Responsibility: search queries over an index and their shared condition tree.
//! Does not own: access policy (see `db::access`) or full-text scoring.
//! Boundary: independent contributors each receive a handle to one named
//! condition group; the query lowers all groups into one predicate.

mod conditions;
mod index;
mod schema;

#[cfg(test)]
mod tests;

pub use conditions::{ConditionScope, Conjunction, SearchConditions};
pub use index::{MemoryIndex, SearchQuery};
pub use schema::IndexSchema;
