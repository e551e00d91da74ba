//! The `scan` use case: evaluate the selected controls against a fact provider and
//! produce a report.

use anyhow::Context;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;
use stigeval_domain::model::Control;
use stigeval_domain::policy::ScanPolicy;
use stigeval_domain::report::{self, DomainReport};
use stigeval_domain::{
    CachingProvider, CancelToken, Cancelled, EvalContext, FactProvider, evaluate_control,
};
use stigeval_settings::{Overrides, ResolvedConfig};
use stigeval_types::ScanReport;
use time::OffsetDateTime;

use crate::facts::TimeoutProvider;
use crate::report::build_report;
use crate::sink::ResultSink;

/// Input for the scan use case.
pub struct ScanInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Control definitions from the registry.
    pub controls: Vec<Control>,
    /// Host facts; wrapped with per-query timeouts and a per-run cache.
    pub provider: Arc<dyn FactProvider>,
}

/// Output from the scan use case.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub report: ScanReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Parse config (empty is allowed, defaults apply) and resolve it with overrides.
pub fn resolve_policy(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        stigeval_settings::StigevalConfigV1::default()
    } else {
        stigeval_settings::parse_config_toml(config_text).context("parse config")?
    };
    stigeval_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Run the scan use case: resolve config, evaluate every selected control, build the report.
///
/// Each result is handed to `sink` as soon as its control finishes.
pub fn run_scan(input: ScanInput<'_>, sink: &mut dyn ResultSink) -> anyhow::Result<ScanOutput> {
    let started_at = OffsetDateTime::now_utc();

    let resolved = resolve_policy(input.config_text, input.overrides)?;
    stigeval_catalog::validate(&input.controls).context("validate controls")?;

    let provider = CachingProvider::new(TimeoutProvider::new(
        input.provider,
        resolved.policy.query_timeout,
    ));
    let domain = evaluate_all(&input.controls, &provider, &resolved.policy, sink)?;

    let report = build_report(domain, started_at, OffsetDateTime::now_utc());
    Ok(ScanOutput {
        report,
        resolved_config: resolved,
    })
}

/// Evaluate the selected controls on a pool of `policy.jobs` workers.
pub fn evaluate_all(
    controls: &[Control],
    provider: &dyn FactProvider,
    policy: &ScanPolicy,
    sink: &mut dyn ResultSink,
) -> anyhow::Result<DomainReport> {
    let selected: Vec<&Control> = controls.iter().filter(|c| policy.is_selected(c)).collect();
    tracing::info!(
        selected = selected.len(),
        total = controls.len(),
        jobs = policy.jobs,
        profile = %policy.profile,
        "scan started"
    );

    let cancel = match policy.scan_timeout {
        Some(limit) => CancelToken::with_deadline(Instant::now() + limit),
        None => CancelToken::new(),
    };
    let ctx = EvalContext {
        provider,
        policy,
        cancel: &cancel,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(policy.jobs.max(1))
        .thread_name(|i| format!("stigeval-eval-{i}"))
        .build()
        .context("build worker pool")?;

    let (tx, rx) = mpsc::channel();
    let mut results = Vec::with_capacity(selected.len());
    let mut abandoned = 0u32;
    let mut sink_error: Option<anyhow::Error> = None;

    pool.in_place_scope(|scope| {
        for &control in &selected {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let _ = tx.send((control.id.as_str(), evaluate_control(control, &ctx)));
            });
        }
        drop(tx);

        for (control_id, outcome) in rx {
            match outcome {
                Ok(result) => {
                    if sink_error.is_none() {
                        sink_error = sink.emit(&result).err();
                    }
                    results.push(result);
                }
                Err(Cancelled) => {
                    tracing::warn!(control = control_id, "control abandoned after cancellation");
                    abandoned += 1;
                }
            }
        }
    });

    if let Some(err) = sink_error {
        return Err(err.context("emit control result"));
    }

    let domain = report::summarize(results, selected.len() as u32, abandoned, policy);
    tracing::info!(
        verdict = ?domain.verdict,
        evaluated = domain.data.controls_evaluated,
        abandoned = domain.data.controls_abandoned,
        "scan finished"
    );
    Ok(domain)
}
