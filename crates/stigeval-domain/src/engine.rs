use crate::applicability::{self, Applicability};
use crate::assertion;
use crate::cancel::CancelToken;
use crate::classify::{self, BranchOutcome, GroupOutcome};
use crate::error::{Cancelled, EvalError};
use crate::model::{Assertion, Branch, Control, ValueExpr};
use crate::policy::ScanPolicy;
use crate::provider::FactProvider;
use crate::report::{self, DomainReport};
use crate::resolve::ValueResolver;
use crate::session::Session;
use stigeval_types::{ControlResult, Evidence, EvidenceOutcome, Value};

/// Shared, read-only inputs for evaluating any number of controls.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub provider: &'a dyn FactProvider,
    pub policy: &'a ScanPolicy,
    pub cancel: &'a CancelToken,
}

/// Evaluate one control to a terminal result.
///
/// Returns `Err(Cancelled)` if cancellation was observed at a provider boundary;
/// nothing of the partial evaluation is kept.
pub fn evaluate_control(
    control: &Control,
    ctx: &EvalContext<'_>,
) -> Result<ControlResult, Cancelled> {
    let impact = ctx.policy.impact_for(control);
    let mut session = Session::new(ctx.provider, ctx.cancel);

    let applicability =
        applicability::evaluate(&control.applicability, &mut session, &ctx.policy.inputs);
    if applicability == Err(EvalError::Cancelled) {
        return Err(Cancelled);
    }

    let branch = match &applicability {
        Ok(Applicability::InScope(id)) => match control.branch(*id) {
            Some(branch) => Some(evaluate_branch(branch, &mut session)?),
            None => None,
        },
        _ => None,
    };

    let result = classify::classify(&control.id, impact, &applicability, branch);
    tracing::debug!(
        control = %result.control_id,
        status = result.status.as_str(),
        branch = result.branch.as_deref().unwrap_or("-"),
        "control evaluated"
    );
    Ok(result)
}

/// Evaluate every selected control sequentially and summarize.
///
/// Controls abandoned after cancellation are counted, not reported.
pub fn evaluate(controls: &[Control], ctx: &EvalContext<'_>) -> DomainReport {
    let selected: Vec<&Control> = controls
        .iter()
        .filter(|c| ctx.policy.is_selected(c))
        .collect();

    let mut results = Vec::with_capacity(selected.len());
    let mut abandoned = 0u32;
    for control in &selected {
        match evaluate_control(control, ctx) {
            Ok(result) => results.push(result),
            Err(Cancelled) => abandoned += 1,
        }
    }

    report::summarize(results, selected.len() as u32, abandoned, ctx.policy)
}

fn evaluate_branch(branch: &Branch, session: &mut Session<'_>) -> Result<BranchOutcome, Cancelled> {
    // One resolver per control evaluation: lookups shared by assertions resolve once.
    let mut resolver = ValueResolver::new();
    let mut groups = Vec::with_capacity(branch.any_of.len());
    let mut evidence = Vec::new();

    for (index, group) in branch.any_of.iter().enumerate() {
        let mut results = Vec::with_capacity(group.all.len());
        for assertion in &group.all {
            let (result, observed, detail) = match check_assertion(assertion, session, &mut resolver)
            {
                Err(EvalError::Cancelled) => return Err(Cancelled),
                Err(err) => (Err(err.clone()), None, Some(err.to_string())),
                Ok(checked) => (Ok(checked.passed), checked.observed, checked.detail),
            };

            evidence.push(Evidence {
                group: index as u32,
                fact: assertion.fact.to_string(),
                check: assertion.check.to_string(),
                outcome: match result {
                    Ok(true) => EvidenceOutcome::Pass,
                    Ok(false) => EvidenceOutcome::Fail,
                    Err(_) => EvidenceOutcome::Error,
                },
                observed,
                detail,
            });
            results.push(result);
        }
        groups.push(GroupOutcome::from_assertions(results));
    }

    Ok(BranchOutcome {
        branch: branch.id,
        groups,
        evidence,
    })
}

struct Checked {
    passed: bool,
    observed: Option<Value>,
    detail: Option<String>,
}

fn check_assertion(
    assertion: &Assertion,
    session: &mut Session<'_>,
    resolver: &mut ValueResolver,
) -> Result<Checked, EvalError> {
    let expected = assertion
        .check
        .expected()
        .map(|expr| resolver.resolve(expr, session))
        .transpose()?;
    let observed = session.fetch(&assertion.fact)?;
    let passed = assertion::evaluate(&assertion.check, observed.as_ref(), expected.as_ref());

    let detail = match (&observed, assertion.check.expected(), &expected) {
        (None, _, _) => Some("fact not present".to_string()),
        (Some(_), Some(ValueExpr::Lookup { .. }), Some(resolved)) => {
            Some(format!("expected value resolved to {resolved}"))
        }
        _ => None,
    };

    Ok(Checked {
        passed,
        observed,
        detail,
    })
}
