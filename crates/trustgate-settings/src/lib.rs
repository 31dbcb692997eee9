//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{CacheSection, EngineSection, LoggingSection, TrustgateConfigV1};
pub use presets::{PROFILES, preset};
pub use resolve::{LogFormat, LogSettings, Overrides, ResolvedConfig};

/// Parse `trustgate.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<TrustgateConfigV1> {
    let cfg: TrustgateConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (profile preset + file values + CLI overrides).
pub fn resolve_config(
    cfg: TrustgateConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
