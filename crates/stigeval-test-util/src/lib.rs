//! Shared test utilities for the stigeval workspace.
//!
//! Golden reports under `crates/stigeval-cli/tests/fixtures/` are compared after
//! [`normalize_nondeterministic`] so that timing, host and version drift do not matter.

use serde_json::Value;

const TIMESTAMP: &str = "__TIMESTAMP__";

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// `tool.version` and `run.host` are replaced only when the *root* object is a report
/// envelope (`schema`, `tool`, `run`, `verdict`, `results`). Timestamps and `duration_ms`
/// are normalized at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "tool", "run", "verdict", "results"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope {
            if let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
                && tool.contains_key("version")
            {
                tool.insert("version".to_string(), Value::String("__VERSION__".to_string()));
            }
            if let Some(run) = obj.get_mut("run").and_then(Value::as_object_mut)
                && run.contains_key("host")
            {
                run.insert("host".to_string(), Value::String("__HOST__".to_string()));
            }
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "ended_at"] {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String(TIMESTAMP.to_string()));
                }
            }
            if map.contains_key("duration_ms") {
                map.insert("duration_ms".to_string(), Value::Number(0.into()));
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}
