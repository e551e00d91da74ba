//! Value resolution for assertion expectations.
//!
//! Literal expectations pass through untouched. Lookup expectations (account name to
//! SID, mostly) are answered by the fact provider, normalized, and memoized for the
//! rest of the control evaluation.

use crate::error::EvalError;
use crate::model::{FactQuery, ValueExpr};
use crate::session::Session;
use std::collections::BTreeMap;
use stigeval_types::Value;

#[derive(Debug, Default)]
pub struct ValueResolver {
    resolved: BTreeMap<FactQuery, Result<Value, EvalError>>,
}

impl ValueResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        expr: &ValueExpr,
        session: &mut Session<'_>,
    ) -> Result<Value, EvalError> {
        let query = match expr {
            ValueExpr::Literal { value } => return Ok(value.clone()),
            ValueExpr::Lookup { query } => query,
        };

        if let Some(done) = self.resolved.get(query) {
            return done.clone();
        }

        let outcome = lookup(query, session);
        if outcome == Err(EvalError::Cancelled) {
            return outcome;
        }
        tracing::debug!(lookup = %query, ok = outcome.is_ok(), "resolved lookup");
        self.resolved.insert(query.clone(), outcome.clone());
        outcome
    }
}

fn lookup(query: &FactQuery, session: &mut Session<'_>) -> Result<Value, EvalError> {
    let unresolved = |reason: String| EvalError::Resolution {
        lookup: query.to_string(),
        reason,
    };

    let answer = match session.fetch(query) {
        Ok(answer) => answer,
        Err(EvalError::Provider { source, .. }) => return Err(unresolved(source.to_string())),
        Err(other) => return Err(other),
    };
    let raw = answer.ok_or_else(|| unresolved("lookup returned no value".to_string()))?;
    normalize_response(raw).map_err(unresolved)
}

/// Normalize a raw lookup answer.
///
/// Text is trimmed and one layer of JSON string quoting is removed (lookup helpers
/// commonly serialize their output). A JSON array of strings becomes a list. A
/// one-element list collapses to its member. Empty answers are errors: an empty
/// expected value would make the comparison meaningless.
pub fn normalize_response(raw: Value) -> Result<Value, String> {
    let value = match raw {
        Value::Integer(n) => Value::Integer(n),
        Value::Text(s) => parse_text(&s),
        Value::List(items) => Value::List(items.iter().map(|i| unquote(i.trim())).collect()),
    };

    let value = match value {
        Value::List(mut items) => {
            items.retain(|i| !i.is_empty());
            if items.len() == 1 {
                Value::Text(items.remove(0))
            } else {
                Value::List(items)
            }
        }
        other => other,
    };

    if value.is_empty() {
        return Err("lookup returned an empty value".to_string());
    }
    Ok(value)
}

fn parse_text(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Value::List(items.iter().map(|i| i.trim().to_string()).collect());
        }
    }
    Value::Text(unquote(trimmed))
}

fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(s) {
            return inner.trim().to_string();
        }
    }
    s.to_string()
}
