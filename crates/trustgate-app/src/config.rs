use anyhow::Context;
use trustgate_settings::{Overrides, ResolvedConfig, TrustgateConfigV1};

/// Parse an optional `trustgate.toml` and resolve it against the CLI overrides.
///
/// No config file means the profile preset alone.
pub fn load_config(config_text: Option<&str>, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = match config_text {
        Some(text) => trustgate_settings::parse_config_toml(text).context("parse trustgate config")?,
        None => TrustgateConfigV1::default(),
    };
    trustgate_settings::resolve_config(cfg, overrides).context("resolve trustgate config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustgate_settings::LogFormat;

    #[test]
    fn missing_file_uses_standard_profile() {
        let resolved = load_config(None, Overrides::default()).expect("config");
        assert_eq!(resolved.profile, "standard");
        assert!(!resolved.cache.cache_results);
    }

    #[test]
    fn overrides_beat_file_values() {
        let text = "profile = \"uncached\"\n[logging]\nformat = \"pretty\"\n";
        let resolved = load_config(
            Some(text),
            Overrides {
                log_format: Some("json".to_string()),
                ..Overrides::default()
            },
        )
        .expect("config");
        assert_eq!(resolved.profile, "uncached");
        assert_eq!(resolved.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_toml_is_reported_with_context() {
        let err = load_config(Some("engine = ["), Overrides::default()).expect_err("invalid");
        assert!(format!("{err:#}").contains("parse trustgate config"));
    }
}
