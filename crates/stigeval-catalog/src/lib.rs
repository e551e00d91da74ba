//! Control registry for stigeval.
//!
//! This crate is intentionally boring:
//! - the built-in Windows Server 2016 controls, as declarative data
//! - loading and validating JSON catalog files
//! - a small [`ControlRegistry`] trait the scan use case reads from

#![forbid(unsafe_code)]

mod builtin;

use anyhow::Context;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use stigeval_domain::ModelError;
use stigeval_domain::model::Control;

/// Stable schema identifier for catalog files.
pub const SCHEMA_CATALOG_V1: &str = "stigeval.catalog.v1";

/// Read-only source of control definitions.
pub trait ControlRegistry {
    fn list_controls(&self) -> Vec<Control>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported catalog schema '{0}'")]
    Schema(String),
    #[error("control '{0}' is defined more than once")]
    DuplicateId(String),
    #[error(transparent)]
    Invalid(#[from] ModelError),
}

/// On-disk catalog shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub schema: Option<String>,
    pub controls: Vec<Control>,
}

/// Controls compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCatalog;

impl ControlRegistry for BuiltinCatalog {
    fn list_controls(&self) -> Vec<Control> {
        builtin::controls()
    }
}

/// Controls loaded from a validated catalog file.
#[derive(Clone, Debug)]
pub struct JsonCatalog {
    controls: Vec<Control>,
}

impl JsonCatalog {
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        if let Some(schema) = file.schema.as_deref().filter(|s| *s != SCHEMA_CATALOG_V1) {
            return Err(CatalogError::Schema(schema.to_string()));
        }
        validate(&file.controls)?;
        Ok(Self {
            controls: file.controls,
        })
    }

    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
        Self::parse(&text).with_context(|| format!("load catalog {}", path))
    }
}

impl ControlRegistry for JsonCatalog {
    fn list_controls(&self) -> Vec<Control> {
        self.controls.clone()
    }
}

/// Every control must be structurally sound and ids unique.
pub fn validate(controls: &[Control]) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for control in controls {
        control.validate()?;
        if !seen.insert(control.id.as_str()) {
            return Err(CatalogError::DuplicateId(control.id.clone()));
        }
    }
    Ok(())
}

/// Serialize a control set in catalog file form.
pub fn to_catalog_json(controls: &[Control]) -> anyhow::Result<String> {
    let file = CatalogFile {
        schema: Some(SCHEMA_CATALOG_V1.to_string()),
        controls: controls.to_vec(),
    };
    serde_json::to_string_pretty(&file).context("serialize catalog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_survives_a_file_round_trip() {
        let json = to_catalog_json(&BuiltinCatalog.list_controls()).expect("serialize");
        let loaded = JsonCatalog::parse(&json).expect("parse");
        assert_eq!(loaded.list_controls(), BuiltinCatalog.list_controls());
    }

    #[test]
    fn rejects_duplicates_and_foreign_schemas() {
        let mut controls = BuiltinCatalog.list_controls();
        controls.push(controls[0].clone());
        let json = to_catalog_json(&controls).expect("serialize");
        assert!(matches!(
            JsonCatalog::parse(&json),
            Err(CatalogError::DuplicateId(id)) if id == "V-73499"
        ));

        let err = JsonCatalog::parse(r#"{"schema":"other.v9","controls":[]}"#);
        assert!(matches!(err, Err(CatalogError::Schema(_))));
    }

    #[test]
    fn rejects_structurally_invalid_controls() {
        let json = r#"{
            "controls": [{
                "id": "V-1",
                "title": "missing domain branch",
                "impact": 0.5,
                "applicability": { "branching": "by_membership" },
                "branches": [{
                    "id": "workgroup",
                    "any_of": [{ "all": [{ "fact": { "name": "x" }, "check": { "op": "exists" } }] }]
                }]
            }]
        }"#;
        assert!(matches!(
            JsonCatalog::parse(json),
            Err(CatalogError::Invalid(ModelError::MissingBranch { .. }))
        ));
    }
}
