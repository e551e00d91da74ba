use stigeval_domain::policy::{ControlSelection, FailOn, OperatorInputs, ScanPolicy};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_PROFILE: &str = "strict";

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything site-specific goes into `stigeval.toml`.
pub fn preset(profile: &str) -> Option<ScanPolicy> {
    match profile {
        "strict" => Some(strict_profile()),
        "standard" => Some(standard_profile()),
        _ => None,
    }
}

fn strict_profile() -> ScanPolicy {
    ScanPolicy {
        profile: "strict".to_string(),
        fail_on: FailOn::Error,
        jobs: 4,
        query_timeout: Duration::from_millis(5_000),
        scan_timeout: None,
        inputs: OperatorInputs::new(),
        selection: ControlSelection::default(),
        controls: BTreeMap::new(),
    }
}

fn standard_profile() -> ScanPolicy {
    // Errors still show up in the report, they just do not fail the run.
    ScanPolicy {
        profile: "standard".to_string(),
        fail_on: FailOn::Finding,
        ..strict_profile()
    }
}
