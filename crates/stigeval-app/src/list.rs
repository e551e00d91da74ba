//! The `list` use case: show the controls a scan would consider.

use stigeval_domain::model::Control;
use stigeval_domain::policy::ScanPolicy;
use stigeval_types::Impact;

#[derive(Clone, Debug, PartialEq)]
pub struct ControlSummary {
    pub id: String,
    pub stig_id: Option<String>,
    /// Effective impact after config overrides.
    pub impact: Impact,
    pub selected: bool,
    pub title: String,
}

pub fn run_list(controls: &[Control], policy: &ScanPolicy) -> Vec<ControlSummary> {
    let mut out: Vec<ControlSummary> = controls
        .iter()
        .map(|c| ControlSummary {
            id: c.id.clone(),
            stig_id: c.tags.stig_id.clone(),
            impact: policy.impact_for(c),
            selected: policy.is_selected(c),
            title: c.title.clone(),
        })
        .collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

/// One line per control; deselected controls are marked with `-`.
pub fn format_control_list(summaries: &[ControlSummary]) -> String {
    let mut out = String::new();
    for s in summaries {
        let mark = if s.selected { '+' } else { '-' };
        out.push_str(&format!(
            "{mark} {:<10} {:<18} {:.1}  {}\n",
            s.id,
            s.stig_id.as_deref().unwrap_or("-"),
            s.impact.value(),
            s.title
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::resolve_policy;
    use stigeval_catalog::{BuiltinCatalog, ControlRegistry};
    use stigeval_settings::Overrides;

    #[test]
    fn listing_reflects_config() {
        let policy = resolve_policy(
            "exclude = [\"V-73499\"]\n[controls.\"V-73771\"]\nimpact = 0.7\n",
            Overrides::default(),
        )
        .expect("policy")
        .policy;
        let list = run_list(&BuiltinCatalog.list_controls(), &policy);

        assert_eq!(list.len(), 4);
        assert_eq!(list[0].id, "V-73499");
        assert!(!list[0].selected);
        let v73771 = list.iter().find(|s| s.id == "V-73771").expect("V-73771");
        assert_eq!(v73771.impact, Impact::HIGH);
        assert!(v73771.selected);

        let text = format_control_list(&list);
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().next().unwrap_or_default().starts_with("- V-73499"));
        assert!(text.contains("+ V-73771"));
    }
}
