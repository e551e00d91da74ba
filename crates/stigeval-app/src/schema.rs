//! JSON schemas for the files stigeval reads and writes.

use anyhow::Context;
use stigeval_types::{FactSnapshot, ScanReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    Config,
    Report,
    Facts,
}

pub fn schema_json(kind: SchemaKind) -> anyhow::Result<String> {
    let schema = match kind {
        SchemaKind::Config => stigeval_settings::config_schema(),
        SchemaKind::Report => schemars::schema_for!(ScanReport),
        SchemaKind::Facts => schemars::schema_for!(FactSnapshot),
    };
    serde_json::to_string_pretty(&schema).context("serialize schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_is_an_object_schema() {
        for kind in [SchemaKind::Config, SchemaKind::Report, SchemaKind::Facts] {
            let text = schema_json(kind).expect("schema");
            let value: serde_json::Value = serde_json::from_str(&text).expect("json");
            assert_eq!(value["type"], "object", "{kind:?}");
        }
    }

    #[test]
    fn report_schema_requires_the_envelope() {
        let value: serde_json::Value =
            serde_json::from_str(&schema_json(SchemaKind::Report).expect("schema")).expect("json");
        let required: Vec<&str> = value["required"]
            .as_array()
            .expect("required")
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        for key in ["schema", "tool", "run", "verdict", "results", "data"] {
            assert!(required.contains(&key), "missing {key}");
        }
    }
}
