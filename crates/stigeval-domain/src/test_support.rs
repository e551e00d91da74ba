use crate::model::FactQuery;
use crate::policy::{ControlSelection, FailOn, OperatorInputs, ScanPolicy};
use crate::provider::MemoryProvider;
use std::collections::BTreeMap;
use std::time::Duration;
use stigeval_types::{ControlResult, Impact, Status, Value, ids};

pub fn policy() -> ScanPolicy {
    ScanPolicy {
        profile: "test".to_string(),
        fail_on: FailOn::Finding,
        jobs: 1,
        query_timeout: Duration::from_secs(5),
        scan_timeout: None,
        inputs: OperatorInputs::new(),
        selection: ControlSelection::default(),
        controls: BTreeMap::new(),
    }
}

/// Add `host.domain_role` (as WMI reports it, text) and `host.domain`.
pub fn role_facts(provider: MemoryProvider, domain_role: i64, domain: &str) -> MemoryProvider {
    provider
        .with(
            FactQuery::new(ids::FACT_DOMAIN_ROLE),
            Value::text(domain_role.to_string()),
        )
        .with(FactQuery::new(ids::FACT_DOMAIN_NAME), Value::text(domain))
}

pub fn result(control_id: &str, status: Status) -> ControlResult {
    ControlResult {
        control_id: control_id.to_string(),
        status,
        impact: if status == Status::NotApplicable {
            Impact::ZERO
        } else {
            Impact::MEDIUM
        },
        code: None,
        note: None,
        branch: None,
        evidence: Vec::new(),
    }
}
