//! Use case orchestration for stigeval.
//!
//! This crate provides the application layer: use cases that coordinate the domain, catalog and
//! settings layers. It is intentionally thin and delegates evaluation to the domain crate.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod facts;
mod list;
mod report;
mod scan;
mod schema;
mod sink;

pub use facts::{SnapshotProvider, TimeoutProvider};
pub use list::{ControlSummary, format_control_list, run_list};
pub use report::{build_report, runtime_error_report, serialize_report, verdict_exit_code};
pub use scan::{ScanInput, ScanOutput, evaluate_all, resolve_policy, run_scan};
pub use schema::{SchemaKind, schema_json};
pub use sink::{CollectingSink, JsonLinesSink, ResultSink, TextLinesSink};
