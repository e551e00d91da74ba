//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{ConfigInput, ControlConfig, SCHEMA_CONFIG_V1, StigevalConfigV1};
pub use resolve::{Overrides, ResolvedConfig, parse_input_assignment};

/// Parse `stigeval.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<StigevalConfigV1> {
    let cfg: StigevalConfigV1 = toml::from_str(input)?;
    if let Some(schema) = cfg.schema.as_deref().filter(|s| *s != SCHEMA_CONFIG_V1) {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }
    Ok(cfg)
}

/// Resolve the scan policy used by the engine (profile preset, then config, then overrides).
pub fn resolve_config(
    cfg: StigevalConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// JSON schema for `stigeval.toml`.
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(StigevalConfigV1)
}
