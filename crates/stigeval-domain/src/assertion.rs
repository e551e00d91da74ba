//! Comparison operators between an observed fact and a resolved expectation.
//!
//! These are pure. An absent fact fails every operator except [`Check::Exists`],
//! which is exactly the question of presence.

use crate::model::Check;
use stigeval_types::Value;

pub fn evaluate(check: &Check, actual: Option<&Value>, expected: Option<&Value>) -> bool {
    match (check, actual, expected) {
        (Check::Exists, actual, _) => actual.is_some(),
        (_, None, _) | (_, _, None) => false,
        (Check::Equals { .. }, Some(a), Some(e)) => equals(a, e),
        (Check::SetEquals { .. }, Some(a), Some(e)) => set_equals(a, e),
        (Check::SetIncludes { .. }, Some(a), Some(e)) => set_includes(a, e),
    }
}

/// Numeric when either side is an integer and both read as numbers; case-sensitive
/// text otherwise. Lists compare element-wise in order.
pub fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Integer(_), _) | (_, Value::Integer(_)) => {
            match (actual.as_integer(), expected.as_integer()) {
                (Some(a), Some(e)) => a == e,
                _ => false,
            }
        }
        (Value::Text(a), Value::Text(e)) => a == e,
        (Value::List(a), Value::List(e)) => a == e,
        (Value::List(a), Value::Text(e)) | (Value::Text(e), Value::List(a)) => {
            a.len() == 1 && a[0] == *e
        }
    }
}

/// Order-insensitive equality; two empty sets are equal.
pub fn set_equals(actual: &Value, expected: &Value) -> bool {
    actual.members() == expected.members()
}

/// Every expected member is present in the actual set.
pub fn set_includes(actual: &Value, expected: &Value) -> bool {
    expected.members().is_subset(&actual.members())
}
