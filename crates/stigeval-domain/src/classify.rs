use crate::applicability::Applicability;
use crate::error::EvalError;
use crate::model::BranchId;
use stigeval_types::{ControlResult, Evidence, Impact, Status, ids};

/// Result of one check group (AND over its assertions).
#[derive(Clone, Debug, PartialEq)]
pub enum GroupOutcome {
    Passed,
    Failed,
    Errored(EvalError),
}

impl GroupOutcome {
    /// Fold assertion results: an error wins over a mismatch, a mismatch over a pass.
    pub fn from_assertions<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<bool, EvalError>>,
    {
        let mut outcome = GroupOutcome::Passed;
        for result in results {
            match result {
                Err(err) => {
                    if !matches!(outcome, GroupOutcome::Errored(_)) {
                        outcome = GroupOutcome::Errored(err);
                    }
                }
                Ok(false) if outcome == GroupOutcome::Passed => outcome = GroupOutcome::Failed,
                Ok(_) => {}
            }
        }
        outcome
    }
}

/// Everything evaluated for the selected branch.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchOutcome {
    pub branch: BranchId,
    pub groups: Vec<GroupOutcome>,
    pub evidence: Vec<Evidence>,
}

/// Map applicability and group outcomes to a terminal status.
///
/// `NotApplicable` forces impact to zero. Any errored group makes the control an
/// `Error` even when another group passed: a partial answer is not a confirmed pass.
pub fn classify(
    control_id: &str,
    impact: Impact,
    applicability: &Result<Applicability, EvalError>,
    branch: Option<BranchOutcome>,
) -> ControlResult {
    let selected = match applicability {
        Err(err) => return errored(control_id, impact, err, None, Vec::new()),
        Ok(Applicability::NotApplicable { code, note }) => {
            return ControlResult {
                control_id: control_id.to_string(),
                status: Status::NotApplicable,
                impact: Impact::ZERO,
                code: Some((*code).to_string()),
                note: Some(note.clone()),
                branch: None,
                evidence: Vec::new(),
            };
        }
        Ok(Applicability::InScope(id)) => *id,
    };

    let Some(outcome) = branch else {
        let err = EvalError::Applicability(format!(
            "branch '{}' selected but not defined",
            selected.as_str()
        ));
        return errored(control_id, impact, &err, Some(selected), Vec::new());
    };

    if let Some(err) = outcome.groups.iter().find_map(|g| match g {
        GroupOutcome::Errored(err) => Some(err),
        _ => None,
    }) {
        return errored(control_id, impact, err, Some(outcome.branch), outcome.evidence);
    }

    let passed = outcome.groups.contains(&GroupOutcome::Passed);
    ControlResult {
        control_id: control_id.to_string(),
        status: if passed { Status::Passed } else { Status::Failed },
        impact,
        code: None,
        note: None,
        branch: Some(outcome.branch.as_str().to_string()),
        evidence: outcome.evidence,
    }
}

fn errored(
    control_id: &str,
    impact: Impact,
    err: &EvalError,
    branch: Option<BranchId>,
    evidence: Vec<Evidence>,
) -> ControlResult {
    ControlResult {
        control_id: control_id.to_string(),
        status: Status::Error,
        impact,
        code: Some(err.code().to_string()),
        note: Some(format!("evaluation error, compliance not determined: {err}")),
        branch: branch.map(|b| b.as_str().to_string()),
        evidence,
    }
}
