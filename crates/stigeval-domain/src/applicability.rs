//! Shared applicability evaluation over declarative per-control rules.

use crate::error::EvalError;
use crate::host::{DomainMembership, RoleSource};
use crate::model::{ApplicabilityRule, BranchId, Branching};
use crate::policy::OperatorInputs;
use stigeval_types::ids;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applicability {
    InScope(BranchId),
    NotApplicable { code: &'static str, note: String },
}

/// Select exactly one branch, or decide the control does not apply.
///
/// Order matters: a role exclusion wins over everything, then the branch is chosen,
/// then operator exemptions for that branch are applied. Role facts are only read
/// when the step that needs them is reached, so an excluded role never depends on
/// domain membership.
pub fn evaluate(
    rule: &ApplicabilityRule,
    roles: &mut impl RoleSource,
    inputs: &OperatorInputs,
) -> Result<Applicability, EvalError> {
    if let Some(exclusion) = &rule.exclude {
        let role = roles.machine_role()?;
        if exclusion.roles.contains(&role.class()) {
            return Ok(Applicability::NotApplicable {
                code: ids::CODE_ROLE_OUT_OF_SCOPE,
                note: exclusion.note.clone(),
            });
        }
    }

    let branch = match rule.branching {
        Branching::Single => BranchId::All,
        Branching::ByMembership => match roles.membership()? {
            DomainMembership::Workgroup => BranchId::Workgroup,
            DomainMembership::DomainJoined => BranchId::Domain,
        },
    };

    if let Some(exemption) = rule
        .exemptions
        .iter()
        .find(|e| e.branch == branch && inputs.flag(&e.input))
    {
        return Ok(Applicability::NotApplicable {
            code: ids::CODE_EXEMPT_BY_INPUT,
            note: exemption.note.clone(),
        });
    }

    Ok(Applicability::InScope(branch))
}
