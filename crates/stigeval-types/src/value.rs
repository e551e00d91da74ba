use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A fact value as returned by a fact provider or recorded in a snapshot.
///
/// Providers only ever hand out three shapes: a text scalar, an integer scalar
/// (registry `REG_DWORD` and friends), or a list of strings (user-right assignments).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Numeric view: integers as-is, text only if it parses after trimming.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::List(_) => None,
        }
    }

    /// Set view used by membership comparisons. Scalars are one-element sets.
    pub fn members(&self) -> BTreeSet<String> {
        match self {
            Value::Integer(n) => BTreeSet::from([n.to_string()]),
            Value::Text(s) => BTreeSet::from([s.clone()]),
            Value::List(items) => items.iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Integer(_) => false,
            Value::Text(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("impact must be a finite number in [0.0, 1.0], got {0}")]
pub struct ImpactError(pub f64);

/// Severity weight of a control, bounded to `[0.0, 1.0]`.
///
/// Not-applicable results always carry [`Impact::ZERO`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "f64", into = "f64")]
pub struct Impact(f64);

impl Impact {
    pub const ZERO: Impact = Impact(0.0);
    pub const LOW: Impact = Impact(0.3);
    pub const MEDIUM: Impact = Impact(0.5);
    pub const HIGH: Impact = Impact(0.7);

    pub fn new(value: f64) -> Result<Self, ImpactError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Impact(value))
        } else {
            Err(ImpactError(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Impact {
    type Error = ImpactError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Impact::new(value)
    }
}

impl From<Impact> for f64 {
    fn from(impact: Impact) -> Self {
        impact.0
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_value_shapes() {
        let v: Value = serde_json::from_str("2").expect("integer");
        assert_eq!(v, Value::Integer(2));
        let v: Value = serde_json::from_str("\"2\"").expect("text");
        assert_eq!(v, Value::text("2"));
        let v: Value = serde_json::from_str("[]").expect("list");
        assert_eq!(v, Value::List(Vec::new()));
    }

    #[test]
    fn numeric_view_trims_text() {
        assert_eq!(Value::text(" 2 ").as_integer(), Some(2));
        assert_eq!(Value::text("two").as_integer(), None);
        assert_eq!(Value::list(["2"]).as_integer(), None);
    }

    #[test]
    fn members_treat_scalars_as_singletons() {
        assert_eq!(Value::text("a").members().len(), 1);
        assert!(Value::List(Vec::new()).members().is_empty());
    }

    #[test]
    fn impact_rejects_out_of_range() {
        assert!(Impact::new(1.5).is_err());
        assert!(Impact::new(-0.1).is_err());
        assert!(Impact::new(f64::NAN).is_err());
        assert_eq!(Impact::new(0.5).map(Impact::value), Ok(0.5));

        let parsed: Result<Impact, _> = serde_json::from_str("2.0");
        assert!(parsed.is_err());
    }

    #[test]
    fn display_lists_quote_members() {
        let v = Value::list(["S-1-5-32-546", "x"]);
        assert_eq!(v.to_string(), "[\"S-1-5-32-546\", \"x\"]");
    }
}
