use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Characters separating individual patterns inside one location setting.
pub const LOCATION_DELIMITERS: &[char] = &[',', ';', ' ', '\t', '\n'];

pub const DEFAULT_MAPPER_LOCATIONS: &str = "classpath*:**/*Mapper.yml";
pub const DEFAULT_SEARCH_PATH: &str = "resources";
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 5;
pub const DEFAULT_PERIOD_SECS: u64 = 15;

/// Split a location setting into individual patterns, dropping empty tokens.
pub fn tokenize_locations(raw: &str) -> Vec<String> {
    raw.split(LOCATION_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split a search path on the platform separator (`:` on unix, `;` on windows).
pub fn split_search_path(raw: &str) -> Vec<PathBuf> {
    env::split_paths(raw)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt<F>(lookup: &F, profile: &str, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed).filter(|s| !s.is_empty()) {
            return Some(v);
        }
    }
    lookup(key).filter(|s| !s.is_empty())
}

fn profiled_parse<F, T>(lookup: &F, profile: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match profiled_opt(lookup, profile, key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

// ── Reload scope ──────────────────────────────────────────────

/// Which resources are re-parsed once a scan reports a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadScope {
    /// Rebuild from every resource seen by the last scan.
    #[default]
    All,
    /// Rebuild from the changed resources only.
    Changed,
}

impl FromStr for ReloadScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ReloadScope::All),
            "changed" => Ok(ReloadScope::Changed),
            other => Err(ConfigError::InvalidValue {
                key: "RELOAD_SCOPE".to_string(),
                value: other.to_string(),
                reason: "expected 'all' or 'changed'".to_string(),
            }),
        }
    }
}

impl fmt::Display for ReloadScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadScope::All => f.write_str("all"),
            ReloadScope::Changed => f.write_str("changed"),
        }
    }
}

// ── Reload config ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Location patterns for mapping documents, in scan order.
    pub mapper_locations: Vec<String>,
    /// Roots searched by `classpath:` / `classpath*:` patterns.
    pub search_roots: Vec<PathBuf>,
    pub initial_delay: Duration,
    pub period: Duration,
    pub scope: ReloadScope,
    /// When false the worker loads once and never polls.
    pub enabled: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            mapper_locations: tokenize_locations(DEFAULT_MAPPER_LOCATIONS),
            search_roots: vec![PathBuf::from(DEFAULT_SEARCH_PATH)],
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECS),
            period: Duration::from_secs(DEFAULT_PERIOD_SECS),
            scope: ReloadScope::default(),
            enabled: true,
        }
    }
}

impl ReloadConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SQLMAP_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env::var("SQLMAP_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(profile, |key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(profile: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let p = profile.trim().to_uppercase();
        let p = p.as_str();

        let locations = profiled_opt(&lookup, p, "MAPPER_LOCATIONS")
            .unwrap_or_else(|| DEFAULT_MAPPER_LOCATIONS.to_string());
        let search_path = profiled_opt(&lookup, p, "MAPPER_SEARCH_PATH")
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string());

        let config = Self {
            profile: p.to_string(),
            mapper_locations: tokenize_locations(&locations),
            search_roots: split_search_path(&search_path),
            initial_delay: Duration::from_secs(profiled_parse(
                &lookup,
                p,
                "RELOAD_INITIAL_DELAY_SECS",
                DEFAULT_INITIAL_DELAY_SECS,
            )?),
            period: Duration::from_secs(profiled_parse(
                &lookup,
                p,
                "RELOAD_PERIOD_SECS",
                DEFAULT_PERIOD_SECS,
            )?),
            scope: profiled_parse(&lookup, p, "RELOAD_SCOPE", ReloadScope::default())?,
            enabled: profiled_parse(&lookup, p, "RELOAD_ENABLED", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::Zero("RELOAD_PERIOD_SECS".to_string()));
        }
        if self.mapper_locations.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MAPPER_LOCATIONS".to_string(),
                value: String::new(),
                reason: "at least one location pattern is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Reload config loaded (profile: {}):", self.profile_label());
        tracing::info!("  locations:   {}", self.mapper_locations.join(", "));
        tracing::info!(
            "  search path: {}",
            self.search_roots
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        tracing::info!(
            "  poller:      enabled={}, delay={}s, period={}s, scope={}",
            self.enabled,
            self.initial_delay.as_secs(),
            self.period.as_secs(),
            self.scope
        );
    }

    /// JSON view of the effective settings, used by the worker's status output.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "locations": self.mapper_locations,
            "search_roots": self.search_roots,
            "initial_delay_secs": self.initial_delay.as_secs(),
            "period_secs": self.period.as_secs(),
            "scope": self.scope,
            "enabled": self.enabled,
        })
    }
}
