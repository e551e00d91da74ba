use crate::policy::{FailOn, ScanPolicy};
use stigeval_types::{ControlResult, ScanData, StatusCounts, Verdict, ids};

#[derive(Clone, Debug)]
pub struct DomainReport {
    pub verdict: Verdict,
    pub results: Vec<ControlResult>,
    pub data: ScanData,
}

/// Order results deterministically and compute the scan verdict.
///
/// Results may arrive in completion order; the report is always sorted by control id.
pub fn summarize(
    mut results: Vec<ControlResult>,
    selected: u32,
    abandoned: u32,
    policy: &ScanPolicy,
) -> DomainReport {
    results.sort_by(compare_results);

    let counts = StatusCounts::from_results(&results);
    let verdict = compute_verdict(&counts, abandoned, policy.fail_on);

    let mut reasons = Vec::new();
    if counts.failed > 0 {
        reasons.push(ids::REASON_FINDINGS_PRESENT.to_string());
    }
    if counts.error > 0 {
        reasons.push(ids::REASON_ERRORS_PRESENT.to_string());
    }
    if abandoned > 0 {
        reasons.push(ids::REASON_CONTROLS_ABANDONED.to_string());
    }

    let data = ScanData {
        profile: policy.profile.clone(),
        controls_selected: selected,
        controls_evaluated: results.len() as u32,
        controls_abandoned: abandoned,
        counts,
        reasons,
        message: None,
    };

    DomainReport {
        verdict,
        results,
        data,
    }
}

/// Findings always fail. Errors and abandoned controls leave compliance undetermined:
/// they fail under `fail_on = "error"` and warn otherwise.
pub fn compute_verdict(counts: &StatusCounts, abandoned: u32, fail_on: FailOn) -> Verdict {
    if counts.failed > 0 {
        return Verdict::Fail;
    }

    if counts.error > 0 || abandoned > 0 {
        return match fail_on {
            FailOn::Error => Verdict::Fail,
            FailOn::Finding => Verdict::Warn,
        };
    }

    Verdict::Pass
}

pub fn compare_results(a: &ControlResult, b: &ControlResult) -> std::cmp::Ordering {
    a.control_id
        .cmp(&b.control_id)
        .then(a.status.as_str().cmp(b.status.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{policy, result};
    use stigeval_types::Status;

    #[test]
    fn results_are_sorted_by_control_id() {
        let report = summarize(
            vec![
                result("V-73771", Status::Passed),
                result("V-73499", Status::Failed),
                result("V-73643", Status::NotApplicable),
            ],
            3,
            0,
            &policy(),
        );
        let order: Vec<&str> = report.results.iter().map(|r| r.control_id.as_str()).collect();
        assert_eq!(order, vec!["V-73499", "V-73643", "V-73771"]);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.data.reasons, vec![ids::REASON_FINDINGS_PRESENT]);
    }

    #[test]
    fn errors_warn_unless_fail_on_error() {
        let counts = StatusCounts {
            passed: 2,
            error: 1,
            ..StatusCounts::default()
        };
        assert_eq!(compute_verdict(&counts, 0, FailOn::Finding), Verdict::Warn);
        assert_eq!(compute_verdict(&counts, 0, FailOn::Error), Verdict::Fail);
    }

    #[test]
    fn abandoned_controls_are_not_a_pass() {
        let counts = StatusCounts {
            passed: 1,
            ..StatusCounts::default()
        };
        assert_eq!(compute_verdict(&counts, 0, FailOn::Finding), Verdict::Pass);
        assert_eq!(compute_verdict(&counts, 2, FailOn::Finding), Verdict::Warn);

        let report = summarize(vec![result("V-1", Status::Passed)], 3, 2, &policy());
        assert_eq!(report.data.controls_selected, 3);
        assert_eq!(report.data.controls_evaluated, 1);
        assert_eq!(report.data.reasons, vec![ids::REASON_CONTROLS_ABANDONED]);
    }

    #[test]
    fn not_applicable_only_passes() {
        let report = summarize(vec![result("V-1", Status::NotApplicable)], 1, 0, &policy());
        assert_eq!(report.verdict, Verdict::Pass);
        assert!(report.data.reasons.is_empty());
    }
}
