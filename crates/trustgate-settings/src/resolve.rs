use crate::{model::TrustgateConfigV1, presets};
use anyhow::Context;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use trustgate_cache::CachePolicy;
use trustgate_domain::EngineConfig;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub log_format: Option<String>,
    pub log_filter: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(v: &str) -> anyhow::Result<Self> {
        match v {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format: {other} (expected pretty|compact|json)"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub filter: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub profile: String,
    pub engine: EngineConfig,
    pub cache: CachePolicy,
    pub logging: LogSettings,
}

pub fn resolve_config(
    cfg: TrustgateConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "standard".to_string());

    let mut resolved = presets::preset(&profile);

    // engine
    if let Some(max_depth) = cfg.engine.max_depth {
        if max_depth == 0 {
            anyhow::bail!("engine.max_depth must be at least 1");
        }
        resolved.engine.max_depth = max_depth;
    }
    if let Some(evaluate_drafts) = cfg.engine.evaluate_drafts {
        resolved.engine.evaluate_drafts = evaluate_drafts;
    }

    // cache
    apply_cache(&mut resolved.cache, &cfg);

    // logging: CLI flags win over the file
    if let Some(format) = overrides.log_format.or(cfg.logging.format) {
        resolved.logging.format = format
            .parse()
            .with_context(|| format!("invalid logging.format '{format}'"))?;
    }
    if let Some(filter) = overrides.log_filter.or(cfg.logging.filter) {
        if filter.trim().is_empty() {
            anyhow::bail!("logging.filter must not be empty");
        }
        resolved.logging.filter = filter;
    }

    Ok(resolved)
}

fn apply_cache(cache: &mut CachePolicy, cfg: &TrustgateConfigV1) {
    let section = &cfg.cache;
    if let Some(secs) = section.policy_ttl_secs {
        cache.policy_ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = section.list_ttl_secs {
        cache.list_ttl = Duration::from_secs(secs);
    }
    if let Some(on) = section.cache_results {
        cache.cache_results = on;
    }
    if let Some(secs) = section.result_ttl_secs {
        cache.result_ttl = Duration::from_secs(secs);
    }
    if let Some(max) = section.max_entries {
        cache.max_entries = max;
    }
}
