use crate::model::{ConfigInput, StigevalConfigV1};
use crate::presets::{self, DEFAULT_PROFILE};
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::time::Duration;
use stigeval_domain::policy::{ControlPolicy, FailOn, InputValue, ScanPolicy};
use stigeval_types::Impact;

/// Command-line overrides; they win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub jobs: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub scan_timeout_ms: Option<u64>,
    /// `name=value` assignments, already split.
    pub inputs: Vec<(String, InputValue)>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub policy: ScanPolicy,
}

pub fn resolve_config(
    cfg: StigevalConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let mut policy = presets::preset(&profile).with_context(|| {
        format!("unknown profile: {profile} (expected 'strict' or 'standard')")
    })?;

    if let Some(fail_on) = cfg.fail_on.as_deref() {
        policy.fail_on = parse_fail_on(fail_on)?;
    }

    if let Some(jobs) = overrides.jobs.or(cfg.jobs) {
        anyhow::ensure!(jobs >= 1, "jobs must be at least 1");
        policy.jobs = jobs as usize;
    }

    if let Some(ms) = overrides.timeout_ms.or(cfg.timeout_ms) {
        anyhow::ensure!(ms >= 1, "timeout_ms must be at least 1");
        policy.query_timeout = Duration::from_millis(ms);
    }

    if let Some(ms) = overrides.scan_timeout_ms.or(cfg.scan_timeout_ms) {
        anyhow::ensure!(ms >= 1, "scan_timeout_ms must be at least 1");
        policy.scan_timeout = Some(Duration::from_millis(ms));
    }

    policy.selection.include = build_globs("include", &cfg.include)?;
    policy.selection.exclude = build_globs("exclude", &cfg.exclude)?;

    for (name, value) in cfg.inputs {
        let value = match value {
            ConfigInput::Flag(b) => InputValue::Flag(b),
            ConfigInput::Text(s) => InputValue::Text(s),
        };
        policy.inputs.insert(name, value);
    }
    for (name, value) in overrides.inputs {
        policy.inputs.insert(name, value);
    }

    // per-control overrides
    for (control_id, cc) in cfg.controls.iter() {
        let entry = policy
            .controls
            .entry(control_id.clone())
            .or_insert_with(ControlPolicy::enabled);

        if let Some(enabled) = cc.enabled {
            entry.enabled = enabled;
        }
        if let Some(impact) = cc.impact {
            entry.impact = Some(
                Impact::new(impact).with_context(|| format!("invalid impact for {control_id}"))?,
            );
        }
    }

    Ok(ResolvedConfig { policy })
}

/// Split a `name=value` operator input. `true`/`false` become flags.
pub fn parse_input_assignment(raw: &str) -> anyhow::Result<(String, InputValue)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("invalid input '{raw}' (expected name=value)"))?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "invalid input '{raw}': empty name");

    let value = value.trim();
    let value = match value.to_ascii_lowercase().as_str() {
        "true" => InputValue::Flag(true),
        "false" => InputValue::Flag(false),
        _ => InputValue::Text(value.to_string()),
    };
    Ok((name.to_string(), value))
}

fn build_globs(key: &str, patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid {key} glob: {pattern}"))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .with_context(|| format!("invalid {key} globs"))?;
    Ok(Some(set))
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "finding" => Ok(FailOn::Finding),
        "error" => Ok(FailOn::Error),
        other => anyhow::bail!("unknown fail_on: {other} (expected finding|error)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;
    use stigeval_types::ids;

    fn resolve(toml: &str, overrides: Overrides) -> anyhow::Result<ScanPolicy> {
        let cfg = parse_config_toml(toml)?;
        Ok(resolve_config(cfg, overrides)?.policy)
    }

    #[test]
    fn empty_config_is_the_strict_preset() {
        let policy = resolve("", Overrides::default()).expect("resolve");
        assert_eq!(policy.profile, "strict");
        assert_eq!(policy.fail_on, FailOn::Error);
        assert_eq!(policy.query_timeout, Duration::from_millis(5_000));
        assert!(policy.scan_timeout.is_none());
        assert!(policy.selection.selects("V-73499"));
    }

    #[test]
    fn config_then_overrides() {
        let toml = r#"
schema = "stigeval.config.v1"
profile = "standard"
jobs = 2
timeout_ms = 250
scan_timeout_ms = 60000
include = ["V-737*"]
exclude = ["V-73763"]

[inputs]
is_AD_only_system = false

[controls."V-73771"]
impact = 0.7

[controls."V-73763"]
enabled = false
"#;
        let overrides = Overrides {
            jobs: Some(8),
            inputs: vec![parse_input_assignment("is_AD_only_system=true").expect("input")],
            ..Overrides::default()
        };
        let policy = resolve(toml, overrides).expect("resolve");

        assert_eq!(policy.profile, "standard");
        assert_eq!(policy.fail_on, FailOn::Finding);
        assert_eq!(policy.jobs, 8);
        assert_eq!(policy.query_timeout, Duration::from_millis(250));
        assert_eq!(policy.scan_timeout, Some(Duration::from_secs(60)));
        assert!(policy.inputs.flag(ids::INPUT_AD_ONLY_SYSTEM));
        assert!(policy.selection.selects("V-73771"));
        assert!(!policy.selection.selects("V-73763"));
        assert!(!policy.selection.selects("V-73499"));
        assert_eq!(
            policy.control_policy("V-73771").and_then(|p| p.impact),
            Some(Impact::HIGH)
        );
        assert_eq!(policy.control_policy("V-73763").map(|p| p.enabled), Some(false));
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = resolve("profile = \"lenient\"", Overrides::default()).expect_err("profile");
        assert!(format!("{err:#}").contains("unknown profile"));

        let err = resolve("fail_on = \"warn\"", Overrides::default()).expect_err("fail_on");
        assert!(format!("{err:#}").contains("fail_on"));

        let err = resolve("jobs = 0", Overrides::default()).expect_err("jobs");
        assert!(format!("{err:#}").contains("jobs"));

        let err = resolve("include = [\"V-[\"]", Overrides::default()).expect_err("glob");
        assert!(format!("{err:#}").contains("include glob"));

        let err = resolve("[controls.\"V-1\"]\nimpact = 1.5", Overrides::default())
            .expect_err("impact");
        assert!(format!("{err:#}").contains("invalid impact for V-1"));
    }

    #[test]
    fn foreign_schema_is_rejected() {
        assert!(parse_config_toml("schema = \"otherscan.config.v1\"").is_err());
    }

    #[test]
    fn input_assignments() {
        assert_eq!(
            parse_input_assignment("is_AD_only_system=TRUE").expect("flag"),
            ("is_AD_only_system".to_string(), InputValue::Flag(true))
        );
        assert_eq!(
            parse_input_assignment("site = corp").expect("text"),
            ("site".to_string(), InputValue::Text("corp".to_string()))
        );
        assert!(parse_input_assignment("novalue").is_err());
        assert!(parse_input_assignment("=x").is_err());
    }

    #[test]
    fn schema_names_every_top_level_key() {
        let schema = serde_json::to_value(crate::config_schema()).expect("schema json");
        let props = &schema["properties"];
        for key in ["profile", "fail_on", "jobs", "timeout_ms", "inputs", "controls"] {
            assert!(props.get(key).is_some(), "missing {key}");
        }
    }
}
