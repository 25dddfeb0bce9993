//! Configuration resolution for bridge-crm
//!
//! Bootstrap settings come from the TOML file (optional). CRM credentials
//! are resolved ENV → TOML; command-line flags are applied on top in `main`.
//!
//! Missing ClickUp credentials are not fatal at startup: the service still
//! serves health and ledger queries, and every CRM-dependent operation
//! reports the configuration error.

use bridge_common::config::{default_data_dir, env_non_empty, is_valid_key};
use bridge_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Default ClickUp REST API root
pub const DEFAULT_CLICKUP_BASE_URL: &str = "https://api.clickup.com/api/v2";
/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

pub const ENV_CLICKUP_API_KEY: &str = "CLICKUP_API_KEY";
pub const ENV_CLICKUP_LIST_ID: &str = "CLICKUP_LIST_ID";
pub const ENV_CLICKUP_SPACE_ID: &str = "CLICKUP_SPACE_ID";
pub const ENV_CLICKUP_TEAM_ID: &str = "CLICKUP_TEAM_ID";

/// Bootstrap configuration loaded from TOML
///
/// Every section is optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub clickup: ClickUpSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub admin: AdminSection,
    /// SQLite sync ledger location
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Which contact store backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmBackend {
    /// ClickUp list (production)
    #[default]
    ClickUp,
    /// Process-local store, for development without CRM credentials
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClickUpSection {
    pub api_key: Option<String>,
    pub list_id: Option<String>,
    pub space_id: Option<String>,
    pub team_id: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub mode: CrmBackend,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitSection {
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSection {
    /// Substring an admin bearer token must contain
    pub token_marker: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved ClickUp connection settings
#[derive(Debug, Clone)]
pub struct ClickUpConfig {
    pub api_key: String,
    pub list_id: String,
    pub space_id: Option<String>,
    pub team_id: Option<String>,
    pub base_url: String,
    /// Bound on every outbound CRM request
    pub timeout: Duration,
}

impl ClickUpConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Fixed-window rate limit for `POST /sync`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitSection {
    pub fn resolve(&self) -> RateLimitConfig {
        let defaults = RateLimitConfig::default();
        RateLimitConfig {
            max_requests: self.max_requests.filter(|n| *n > 0).unwrap_or(defaults.max_requests),
            window: self
                .window_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// Resolve ClickUp settings from ENV and TOML
///
/// **Priority:** ENV → TOML. `CLICKUP_API_KEY` and `CLICKUP_LIST_ID` are
/// required; the error names every missing one.
pub fn resolve_clickup_config(section: &ClickUpSection) -> Result<ClickUpConfig> {
    let api_key = pick("api_key", env_non_empty(ENV_CLICKUP_API_KEY), &section.api_key);
    let list_id = pick("list_id", env_non_empty(ENV_CLICKUP_LIST_ID), &section.list_id);

    let mut missing = Vec::new();
    if api_key.is_none() {
        missing.push(ENV_CLICKUP_API_KEY);
    }
    if list_id.is_none() {
        missing.push(ENV_CLICKUP_LIST_ID);
    }

    let (Some(api_key), Some(list_id)) = (api_key, list_id) else {
        return Err(Error::Config(format!(
            "ClickUp CRM is not configured: {} not set. Set the environment variable(s) \
             or the [clickup] section of bridge-crm.toml",
            missing.join(" and ")
        )));
    };

    let timeout = section
        .timeout_secs
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(ClickUpConfig::DEFAULT_TIMEOUT);

    Ok(ClickUpConfig {
        api_key,
        list_id,
        space_id: pick("space_id", env_non_empty(ENV_CLICKUP_SPACE_ID), &section.space_id),
        team_id: pick("team_id", env_non_empty(ENV_CLICKUP_TEAM_ID), &section.team_id),
        base_url: section
            .base_url
            .clone()
            .filter(|u| is_valid_key(u))
            .unwrap_or_else(|| DEFAULT_CLICKUP_BASE_URL.to_string()),
        timeout,
    })
}

/// ENV value wins; warn when both sources are set
fn pick(name: &str, env_value: Option<String>, toml_value: &Option<String>) -> Option<String> {
    let toml_value = toml_value.clone().filter(|v| is_valid_key(v));
    match (env_value, toml_value) {
        (Some(env), Some(_)) => {
            warn!("ClickUp {} found in both environment and TOML. Using environment.", name);
            Some(env)
        }
        (Some(env), None) => Some(env),
        (None, Some(toml)) => {
            info!("ClickUp {} loaded from TOML config", name);
            Some(toml)
        }
        (None, None) => None,
    }
}

/// Sync ledger path: explicit value, or `<data dir>/bridge-crm.db`
pub fn resolve_database_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| default_data_dir().join("bridge-crm.db"))
}
