use std::time::Duration;

use trustgate_cache::CachePolicy;
use trustgate_domain::EngineConfig;

use crate::resolve::{LogFormat, LogSettings, ResolvedConfig};

pub const PROFILES: &[&str] = &["standard", "uncached", "result-cache"];

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into the config file.
pub fn preset(profile: &str) -> ResolvedConfig {
    match profile {
        "uncached" => uncached_profile(),
        "result-cache" => result_cache_profile(),
        // default
        _ => standard_profile(),
    }
}

fn standard_profile() -> ResolvedConfig {
    ResolvedConfig {
        profile: "standard".to_string(),
        engine: EngineConfig::default(),
        cache: CachePolicy::default(),
        logging: LogSettings {
            format: LogFormat::Compact,
            filter: "info".to_string(),
        },
    }
}

fn uncached_profile() -> ResolvedConfig {
    ResolvedConfig {
        profile: "uncached".to_string(),
        cache: CachePolicy {
            policy_ttl: Duration::ZERO,
            list_ttl: Duration::ZERO,
            cache_results: false,
            result_ttl: Duration::ZERO,
            ..CachePolicy::default()
        },
        ..standard_profile()
    }
}

fn result_cache_profile() -> ResolvedConfig {
    ResolvedConfig {
        profile: "result-cache".to_string(),
        cache: CachePolicy {
            cache_results: true,
            ..CachePolicy::default()
        },
        ..standard_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profiles_fall_back_to_standard() {
        assert_eq!(preset("nope"), preset("standard"));
        assert_eq!(preset("nope").profile, "standard");
    }

    #[test]
    fn every_listed_profile_resolves_to_itself() {
        for name in PROFILES {
            assert_eq!(preset(name).profile, *name);
        }
    }

    #[test]
    fn uncached_disables_every_ttl() {
        let cache = preset("uncached").cache;
        assert!(cache.policy_ttl.is_zero());
        assert!(cache.list_ttl.is_zero());
        assert!(!cache.cache_results);
    }

    #[test]
    fn result_cache_enables_decision_caching() {
        assert!(preset("result-cache").cache.cache_results);
        assert!(!preset("standard").cache.cache_results);
    }
}
