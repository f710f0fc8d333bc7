//! Environment-backed configuration.
//!
//! Small typed accessors in the style of the teacher's
//! `config_loader::env_vars` module: read a variable, fall back to a
//! default, never panic. A missing *critical* credential does not abort
//! the run; it is surfaced as `None` and the orchestrator maps that to
//! `SourceStatus::Unconfigured`.

use std::env;
use std::time::Duration;

pub fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn env_string_or_default(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| default.to_string())
}

pub fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn env_duration_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Header-based bearer credential for one upstream service.
#[derive(Debug, Clone)]
pub struct SourceCredentials {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeCredentials {
    pub base: Option<SourceCredentials>,
    pub secondary_header: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub narrative: Option<NarrativeCredentials>,
    pub trade: Option<SourceCredentials>,
    pub macro_: Option<SourceCredentials>,

    pub ai_enabled: bool,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_max_tokens: u32,
    pub cache_enabled: bool,
    pub cache_ttl_hours: u32,
    pub cache_dir: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let narrative_base = match (env_string("NARRATIVE_BASE_URL"), env_string("NARRATIVE_API_TOKEN")) {
            (Some(base_url), Some(token)) => Some(SourceCredentials { base_url, token }),
            _ => None,
        };
        let narrative = narrative_base.map(|base| NarrativeCredentials {
            base: Some(base),
            secondary_header: env_string("NARRATIVE_API_TOKEN_HEADER"),
        });

        let trade = match (env_string("TRADE_BASE_URL"), env_string("TRADE_API_KEY")) {
            (Some(base_url), Some(token)) => Some(SourceCredentials { base_url, token }),
            _ => None,
        };

        let macro_ = match (env_string("MACRO_BASE_URL"), env_string("MACRO_API_KEY")) {
            (Some(base_url), Some(token)) => Some(SourceCredentials { base_url, token }),
            _ => None,
        };

        Self {
            narrative,
            trade,
            macro_,
            ai_enabled: env_bool("AI_ENABLED", false),
            ai_model: env_string_or_default("AI_MODEL", "claude-opus-4"),
            ai_api_key: env_string("AI_API_KEY"),
            ai_base_url: env_string_or_default("AI_BASE_URL", "https://api.anthropic.com/v1"),
            ai_max_tokens: env_u32("AI_MAX_TOKENS", 4096),
            cache_enabled: env_bool("CACHE_ENABLED", true),
            cache_ttl_hours: env_u32("CACHE_TTL_HOURS", 24),
            cache_dir: env_string("AEROLENS_CACHE_DIR")
                .map(Into::into)
                .unwrap_or_else(|| std::env::temp_dir().join("aerolens-cache")),
            output_dir: env_string("AEROLENS_OUTPUT_DIR")
                .map(Into::into)
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_common_truthy_values() {
        std::env::set_var("AEROLENS_TEST_BOOL", "yes");
        assert!(env_bool("AEROLENS_TEST_BOOL", false));
        std::env::remove_var("AEROLENS_TEST_BOOL");
    }

    #[test]
    fn env_bool_falls_back_on_unset() {
        std::env::remove_var("AEROLENS_TEST_BOOL_UNSET");
        assert!(!env_bool("AEROLENS_TEST_BOOL_UNSET", false));
    }
}
