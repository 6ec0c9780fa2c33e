//! Module: predicate
//! Responsibility: schema-agnostic condition trees and their row evaluation.
//! Does not own: access policy or pagination semantics.
//! Boundary: consumed by entity queries, cursor resume conditions, and
//! access-scoped search conditions.

mod ast;
mod eval;


pub use ast::{CompareOp, ComparePredicate, Predicate};
pub use eval::{FieldPresence, Row, eval};
