use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `trustgate.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustgateConfigV1 {
    /// Optional schema string for tooling (`trustgate.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preset profile: `standard` (default), `uncached` or `result-cache`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineSection {
    /// Maximum expression depth; deeper trees are rejected as malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Evaluate `draft` documents through the enforcing path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate_drafts: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CacheSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_ttl_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_ttl_secs: Option<u64>,

    /// Cache decisions keyed by policy version and context hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_results: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_ttl_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoggingSection {
    /// `pretty`, `compact` (default) or `json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// `tracing` env-filter directive, e.g. `info` or `trustgate_app=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
