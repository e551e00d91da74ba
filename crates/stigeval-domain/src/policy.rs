use crate::model::Control;
use globset::GlobSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use stigeval_types::Impact;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    /// Only failed controls fail the scan; errors downgrade it to a warning.
    Finding,
    /// Failed and errored controls both fail the scan.
    Error,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlPolicy {
    pub enabled: bool,
    pub impact: Option<Impact>,
}

impl ControlPolicy {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            impact: None,
        }
    }
}

/// A named operator input. Only booleans drive rules; a string input is accepted
/// and read as a flag (`true`, `yes` or `1`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Flag(bool),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorInputs(BTreeMap<String, InputValue>);

impl OperatorInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: InputValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with_flag(mut self, name: &str, value: bool) -> Self {
        self.insert(name, InputValue::Flag(value));
        self
    }

    /// Absent inputs are false.
    pub fn flag(&self, name: &str) -> bool {
        match self.0.get(name) {
            Some(InputValue::Flag(b)) => *b,
            Some(InputValue::Text(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            None => false,
        }
    }
}

/// Control-id globs. Patterns are validated by `stigeval-settings`.
#[derive(Clone, Debug, Default)]
pub struct ControlSelection {
    pub include: Option<GlobSet>,
    pub exclude: Option<GlobSet>,
}

impl ControlSelection {
    pub fn selects(&self, control_id: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .map(|set| set.is_match(control_id))
            .unwrap_or(true);
        let excluded = self
            .exclude
            .as_ref()
            .map(|set| set.is_match(control_id))
            .unwrap_or(false);
        included && !excluded
    }
}

#[derive(Clone, Debug)]
pub struct ScanPolicy {
    pub profile: String,
    pub fail_on: FailOn,
    /// Worker threads; 1 evaluates sequentially.
    pub jobs: usize,
    pub query_timeout: Duration,
    pub scan_timeout: Option<Duration>,
    pub inputs: OperatorInputs,
    pub selection: ControlSelection,
    pub controls: BTreeMap<String, ControlPolicy>,
}

impl ScanPolicy {
    pub fn control_policy(&self, control_id: &str) -> Option<&ControlPolicy> {
        self.controls.get(control_id)
    }

    pub fn is_selected(&self, control: &Control) -> bool {
        let enabled = self
            .control_policy(&control.id)
            .map(|p| p.enabled)
            .unwrap_or(true);
        enabled && self.selection.selects(&control.id)
    }

    /// Configured override, else the control's declared impact.
    pub fn impact_for(&self, control: &Control) -> Impact {
        self.control_policy(&control.id)
            .and_then(|p| p.impact)
            .unwrap_or(control.impact)
    }
}
