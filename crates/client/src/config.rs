//! Client configuration: `dispatch.toml` plus environment overrides.
//!
//! # Example
//!
//! ```toml
//! [api]
//! base_url = "https://dispatch.example.org"
//!
//! [display]
//! utc_offset = "+01:00"
//!
//! [refresh]
//! incidents_secs = 15
//! stats_secs = 30
//! ```
//!
//! Environment variables win over the file: `DISPATCH_API_URL`,
//! `DISPATCH_TOKEN`, `DISPATCH_USER_ID`, `DISPATCH_UTC_OFFSET`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use dispatch_core::dates::parse_offset;

use crate::error::ClientError;

pub const CONFIG_FILE: &str = "dispatch.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

pub const ENV_API_URL: &str = "DISPATCH_API_URL";
pub const ENV_TOKEN: &str = "DISPATCH_TOKEN";
pub const ENV_USER_ID: &str = "DISPATCH_USER_ID";
pub const ENV_UTC_OFFSET: &str = "DISPATCH_UTC_OFFSET";

/// Polling intervals are clamped into this window.
pub const MIN_REFRESH_SECS: u64 = 12;
pub const MAX_REFRESH_SECS: u64 = 30;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token. Normally supplied through `DISPATCH_TOKEN` rather than
    /// written to disk.
    pub token: Option<String>,
    /// Id of the signed-in account, used to resolve the current user.
    pub user_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_id: None,
        }
    }
}

/// `[display]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Viewer's UTC offset for dates and day-based filters. UTC when unset.
    pub utc_offset: Option<String>,
}

/// `[refresh]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub incidents_secs: u64,
    pub stats_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            incidents_secs: 15,
            stats_secs: 30,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ClientConfig {
    pub fn from_toml(text: &str) -> Result<Self, ClientError> {
        toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("could not parse '{}': {}", path.display(), e))
        })
    }

    /// An explicit path must exist. Without one, `./dispatch.toml` is used
    /// when present and defaults otherwise.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ClientError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "loading config");
            Self::load(&local)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `DISPATCH_*` variables from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any lookup. Blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.api.token = Some(token);
        }
        if let Some(user) = get(ENV_USER_ID) {
            self.api.user_id = Some(user);
        }
        if let Some(offset) = get(ENV_UTC_OFFSET) {
            self.display.utc_offset = Some(offset);
        }
        self
    }

    pub fn utc_offset(&self) -> Result<UtcOffset, ClientError> {
        match self.display.utc_offset.as_deref() {
            None => Ok(UtcOffset::UTC),
            Some(raw) => parse_offset(raw).map_err(|e| ClientError::Config(e.to_string())),
        }
    }

    pub fn incidents_interval(&self) -> Duration {
        clamp_refresh(self.refresh.incidents_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        clamp_refresh(self.refresh.stats_secs)
    }
}

fn clamp_refresh(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
