use crate::{
    db::predicate::{CompareOp, ComparePredicate, Predicate},
    value::Value,
};
use std::cmp::Ordering;

///
/// FieldPresence
///
/// Result of reading a field from a row during evaluation. Distinguishes
/// a missing field from a present field whose value is `Value::Null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldPresence {
    /// Field exists and has a value (including `Value::Null`).
    Present(Value),
    /// Field is not present on the row.
    Missing,
}

///
/// Row
///
/// Abstraction over a row-like value that can expose fields by name.
/// Decouples evaluation from concrete entity and document types.
///

pub trait Row {
    fn field(&self, name: &str) -> FieldPresence;
}

///
/// Evaluate a predicate against a single row.
///
/// Pure runtime evaluation: no schema access, no ordering or access
/// logic. A comparison against a missing field is `false`.
///
#[must_use]
pub fn eval<R: Row + ?Sized>(row: &R, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::False => false,

        Predicate::And(children) => children.iter().all(|child| eval(row, child)),
        Predicate::Or(children) => children.iter().any(|child| eval(row, child)),
        Predicate::Not(inner) => !eval(row, inner),

        Predicate::Compare(cmp) => eval_compare(row, cmp),

        Predicate::IsNull { field } => {
            matches!(row.field(field), FieldPresence::Present(Value::Null))
        }
        Predicate::IsMissing { field } => matches!(row.field(field), FieldPresence::Missing),
    }
}

fn eval_compare<R: Row + ?Sized>(row: &R, cmp: &ComparePredicate) -> bool {
    let ComparePredicate { field, op, value } = cmp;

    let FieldPresence::Present(actual) = row.field(field) else {
        return false;
    };

    match op {
        CompareOp::Eq => matches_eq(&actual, value),
        CompareOp::Ne => !matches_eq(&actual, value),

        CompareOp::Lt => actual.canonical_cmp(value).is_lt(),
        CompareOp::Lte => actual.canonical_cmp(value).is_le(),
        CompareOp::Gt => actual.canonical_cmp(value).is_gt(),
        CompareOp::Gte => actual.canonical_cmp(value).is_ge(),

        CompareOp::In => in_list(&actual, value),
        CompareOp::NotIn => !in_list(&actual, value),
    }
}

// Multi-valued fields match when any element matches; a list literal on
// the right-hand side is compared as a whole.
fn matches_eq(actual: &Value, expected: &Value) -> bool {
    if values_equal(actual, expected) {
        return true;
    }

    match (actual, expected) {
        (Value::List(items), other) if !matches!(other, Value::List(_)) => {
            items.iter().any(|item| values_equal(item, other))
        }
        _ => false,
    }
}

fn in_list(actual: &Value, candidates: &Value) -> bool {
    let Value::List(candidates) = candidates else {
        return false;
    };

    match actual {
        Value::List(items) => items
            .iter()
            .any(|item| candidates.iter().any(|c| values_equal(item, c))),
        scalar => candidates.iter().any(|c| values_equal(scalar, c)),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    left.canonical_cmp(right) == Ordering::Equal
}
