//! CLI entry point for stigeval.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `stigeval-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use stigeval_app::{
    JsonLinesSink, ResultSink, ScanInput, SchemaKind, SnapshotProvider, TextLinesSink,
    format_control_list, resolve_policy, run_list, run_scan, runtime_error_report,
    schema_json, serialize_report, verdict_exit_code,
};
use stigeval_catalog::{BuiltinCatalog, ControlRegistry, JsonCatalog};
use stigeval_domain::model::Control;
use stigeval_settings::{Overrides, parse_input_assignment};
use stigeval_types::ScanReport;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stigeval",
    version,
    about = "Evaluate Windows STIG controls against collected host facts"
)]
struct Cli {
    /// Path to stigeval config TOML (missing file means defaults).
    #[arg(long, default_value = "stigeval.toml", global = true)]
    config: Utf8PathBuf,

    /// Override profile (strict|standard).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Override worker count.
    #[arg(long, global = true)]
    jobs: Option<u32>,

    /// Override the per-query fact timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Override the whole-scan deadline in milliseconds.
    #[arg(long, global = true)]
    scan_timeout_ms: Option<u64>,

    /// Operator input, e.g. `--input is_AD_only_system=true`. Repeatable.
    #[arg(long = "input", value_name = "NAME=VALUE", global = true)]
    inputs: Vec<String>,

    /// Log verbosity on stderr. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate the selected controls and write the report.
    Scan {
        /// Fact snapshot (`stigeval.facts.v1` JSON) collected from the host.
        #[arg(long)]
        facts: Utf8PathBuf,

        /// Control catalog JSON; the built-in catalog is used when omitted.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/stigeval/report.json")]
        report_out: Utf8PathBuf,

        /// Stream each result as a JSON line to this file instead of text on stdout.
        #[arg(long)]
        jsonl_out: Option<Utf8PathBuf>,
    },

    /// List controls with their effective impact and selection.
    List {
        /// Control catalog JSON; the built-in catalog is used when omitted.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,
    },

    /// Print the JSON schema of a file stigeval reads or writes.
    Schema {
        #[arg(value_enum)]
        kind: SchemaArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaArg {
    Config,
    Report,
    Facts,
}

impl From<SchemaArg> for SchemaKind {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Config => SchemaKind::Config,
            SchemaArg::Report => SchemaKind::Report,
            SchemaArg::Facts => SchemaKind::Facts,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.cmd {
        Commands::Scan {
            facts,
            catalog,
            report_out,
            jsonl_out,
        } => cmd_scan(
            &cli,
            facts,
            catalog.as_deref(),
            report_out,
            jsonl_out.as_deref(),
        ),
        Commands::List { catalog } => cmd_list(&cli, catalog.as_deref()),
        Commands::Schema { kind } => {
            println!("{}", schema_json((*kind).into())?);
            Ok(())
        }
    }
}

fn cmd_scan(
    cli: &Cli,
    facts: &Utf8Path,
    catalog: Option<&Utf8Path>,
    report_out: &Utf8Path,
    jsonl_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let cfg_text = read_config(&cli.config);
        let overrides = overrides(cli)?;
        let controls = load_controls(catalog)?;
        let provider = SnapshotProvider::load(facts)?;
        tracing::debug!(facts = provider.len(), path = %facts, "loaded fact snapshot");

        let mut sink: Box<dyn ResultSink> = match jsonl_out {
            Some(path) => {
                let file = create_file(path).context("open jsonl output")?;
                Box::new(JsonLinesSink::new(BufWriter::new(file)))
            }
            None => Box::new(TextLinesSink::new(std::io::stdout().lock())),
        };

        let output = run_scan(
            ScanInput {
                config_text: &cfg_text,
                overrides,
                controls,
                provider: Arc::new(provider),
            },
            sink.as_mut(),
        )?;

        write_report_file(report_out, &output.report).context("write report json")?;
        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report_file(report_out, &report);
            eprintln!("stigeval error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_list(cli: &Cli, catalog: Option<&Utf8Path>) -> anyhow::Result<()> {
    let cfg_text = read_config(&cli.config);
    let policy = resolve_policy(&cfg_text, overrides(cli)?)?.policy;
    let controls = load_controls(catalog)?;
    print!("{}", format_control_list(&run_list(&controls, &policy)));
    Ok(())
}

/// Missing config file is allowed (defaults apply).
fn read_config(path: &Utf8Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

fn overrides(cli: &Cli) -> anyhow::Result<Overrides> {
    let inputs = cli
        .inputs
        .iter()
        .map(|raw| parse_input_assignment(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Overrides {
        profile: cli.profile.clone(),
        jobs: cli.jobs,
        timeout_ms: cli.timeout_ms,
        scan_timeout_ms: cli.scan_timeout_ms,
        inputs,
    })
}

fn load_controls(catalog: Option<&Utf8Path>) -> anyhow::Result<Vec<Control>> {
    match catalog {
        Some(path) => Ok(JsonCatalog::load(path)?.list_controls()),
        None => Ok(BuiltinCatalog.list_controls()),
    }
}

fn create_file(path: &Utf8Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    File::create(path).with_context(|| format!("create file: {}", path))
}

fn write_report_file(path: &Utf8Path, report: &ScanReport) -> anyhow::Result<()> {
    let data = serialize_report(report)?;
    let mut file = create_file(path)?;
    file.write_all(&data)
        .with_context(|| format!("write report: {}", path))
}
