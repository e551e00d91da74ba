use crate::{Impact, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for stigeval scan reports.
pub const SCHEMA_REPORT_V1: &str = "stigeval.report.v1";

/// Terminal status of one control evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
    NotApplicable,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::NotApplicable => "not_applicable",
            Status::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceOutcome {
    Pass,
    Fail,
    Error,
}

/// One assertion's outcome inside the selected branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Evidence {
    /// Zero-based index of the check group within the branch.
    pub group: u32,
    /// Canonical fact key (`name` plus parameters).
    pub fact: String,
    /// Human-readable form of the comparison, e.g. `equals 2`.
    pub check: String,
    pub outcome: EvidenceOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The record handed to a result sink for every evaluated control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ControlResult {
    pub control_id: String,
    pub status: Status,
    /// Effective severity. Always `0.0` for not-applicable results.
    pub impact: Impact,

    /// Machine-readable reason for not-applicable and error results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Operator-facing explanation for not-applicable and error results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Branch selected by the applicability rule (absent when not applicable or errored early).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCounts {
    pub passed: u32,
    pub failed: u32,
    pub not_applicable: u32,
    pub error: u32,
}

impl StatusCounts {
    pub fn from_results(results: &[ControlResult]) -> Self {
        let mut counts = StatusCounts::default();
        for r in results {
            match r.status {
                Status::Passed => counts.passed += 1,
                Status::Failed => counts.failed += 1,
                Status::NotApplicable => counts.not_applicable += 1,
                Status::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunHost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunMeta {
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<RunHost>,
}

/// Scan-level summary payload for the report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanData {
    pub profile: String,

    pub controls_selected: u32,
    pub controls_evaluated: u32,
    /// Controls dropped at a fact-provider boundary after cancellation.
    pub controls_abandoned: u32,

    pub counts: StatusCounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,

    /// Tool-level failure, set only on runtime error reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The scan report envelope written by the CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanReport {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub verdict: Verdict,
    pub results: Vec<ControlResult>,
    pub data: ScanData,
}
