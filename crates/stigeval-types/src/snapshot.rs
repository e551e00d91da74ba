//! Captured host facts.
//!
//! A snapshot is what a collector run on the target host leaves behind: a flat list of
//! query/answer pairs. Replaying it through a fact provider makes scans reproducible.

use crate::Value;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_FACTS_V1: &str = "stigeval.facts.v1";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FactSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub facts: Vec<FactEntry>,
}

/// One recorded answer. `value` and `error` are mutually exclusive; an entry with
/// neither records that the fact was looked up and not found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FactEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Collector failure message for this query (access denied, timeout, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
