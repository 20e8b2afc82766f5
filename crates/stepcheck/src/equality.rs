//! Deep structural equality over resolved values.
//!
//! - numbers compare numerically (`1` equals `1.0`)
//! - arrays compare element-wise, order matters
//! - objects compare by key set and values, key order does not matter
//! - "undefined" (`None`) equals only "undefined", never `null`

use crate::resolve::Resolved;
use serde_json::{Number, Value};

/// Compare two resolved operands
#[must_use]
pub fn deep_equals(left: &Resolved, right: &Resolved) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => values_equal(left, right),
        _ => false,
    }
}

/// Compare two stored values
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => numbers_equal(l, r),
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| values_equal(l, r)))
        }
        _ => false,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return l == r;
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}
