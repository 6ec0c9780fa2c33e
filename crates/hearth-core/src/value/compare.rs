use crate::value::Value;
use std::cmp::Ordering;

///
/// Canonical Value Rank
///
/// Stable rank used for cross-variant ordering.
/// Rank order is part of deterministic pagination behavior; changing it
/// reorders every connection sorted on a mixed-type field.
///
const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Uint(_) => 2,
        Value::Text(_) => 3,
        Value::List(_) => 4,
    }
}

pub(super) fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = canonical_rank(left).cmp(&canonical_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
        (Value::Int(a), Value::Uint(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Uint(a), Value::Int(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => cmp_lists(a, b),
        // Null vs Null, and every cross-rank pair was handled above.
        _ => Ordering::Equal,
    }
}

fn cmp_lists(left: &[Value], right: &[Value]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ord = canonical_cmp(a, b);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}
