//! Stable DTOs and IDs used across the stigeval workspace.
//!
//! This crate is intentionally boring:
//! - the fact value model shared by providers, snapshots and reports
//! - the bounded impact (severity) type
//! - data types for the emitted per-control results and scan report
//! - stable string IDs for facts, lookups, inputs and result codes

#![forbid(unsafe_code)]

pub mod ids;
pub mod receipt;
pub mod snapshot;
pub mod value;

pub use receipt::{
    ControlResult, Evidence, EvidenceOutcome, RunHost, RunMeta, ScanData, ScanReport, Status,
    StatusCounts, ToolMeta, Verdict, SCHEMA_REPORT_V1,
};
pub use snapshot::{FactEntry, FactSnapshot, SCHEMA_FACTS_V1};
pub use value::{Impact, ImpactError, Value};
