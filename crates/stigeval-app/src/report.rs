use anyhow::Context;
use stigeval_domain::report::DomainReport;
use stigeval_types::{
    RunHost, RunMeta, SCHEMA_REPORT_V1, ScanData, ScanReport, ToolMeta, Verdict, ids,
};
use time::OffsetDateTime;

fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: "stigeval".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn run_meta(started_at: OffsetDateTime, ended_at: OffsetDateTime) -> RunMeta {
    let duration_ms = (ended_at - started_at).whole_milliseconds().max(0) as u64;
    RunMeta {
        started_at,
        ended_at,
        duration_ms,
        host: Some(RunHost {
            os: Some(std::env::consts::OS.to_string()),
            arch: Some(std::env::consts::ARCH.to_string()),
        }),
    }
}

/// Wrap a domain report in the `stigeval.report.v1` envelope.
pub fn build_report(
    domain: DomainReport,
    started_at: OffsetDateTime,
    ended_at: OffsetDateTime,
) -> ScanReport {
    ScanReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        run: run_meta(started_at, ended_at),
        verdict: domain.verdict,
        results: domain.results,
        data: domain.data,
    }
}

/// The report written when the tool itself fails before or during a scan.
pub fn runtime_error_report(message: &str) -> ScanReport {
    let now = OffsetDateTime::now_utc();
    ScanReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        run: run_meta(now, now),
        verdict: Verdict::Fail,
        results: Vec::new(),
        data: ScanData {
            profile: "unknown".to_string(),
            reasons: vec![ids::CODE_RUNTIME_ERROR.to_string()],
            message: Some(message.to_string()),
            ..ScanData::default()
        },
    }
}

pub fn serialize_report(report: &ScanReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

/// Pass and warn exit 0; fail exits 2. Exit code 1 is reserved for runtime errors.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass | Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}
