//! Client configuration
//!
//! Connection settings are layered: the optional YAML file first, then
//! environment variables and flags (clap resolves those two).

use anyhow::{Context, Result, bail};
use oneclick_template::VARIABLE_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Contents of the client configuration file
///
/// ```yaml
/// url: https://captain.example.com
/// password: secret
/// timeout_secs: 120
/// detached: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Platform base URL
    pub url: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Request timeout
    pub timeout_secs: Option<u64>,
    /// Register apps in the background
    pub detached: Option<bool>,
}

impl ClientConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse client config {}", path.display()))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: ClientConfig) -> Self {
        Self {
            url: other.url.or(self.url),
            password: other.password.or(self.password),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            detached: other.detached.or(self.detached),
        }
    }

    /// Check every required setting is present
    pub fn into_connection(self) -> Result<ConnectionSettings> {
        let Some(url) = self.url.filter(|u| !u.trim().is_empty()) else {
            bail!("No platform URL configured (use --url, CAPTAIN_URL or the config file)");
        };
        let Some(password) = self.password else {
            bail!(
                "No platform password configured (use --password, CAPTAIN_PASSWORD or the config file)"
            );
        };

        Ok(ConnectionSettings {
            url,
            password,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            detached: self.detached.unwrap_or(false),
        })
    }
}

/// Fully resolved connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    /// Platform base URL
    pub url: String,
    /// Login password
    pub password: String,
    /// Request timeout
    pub timeout: Duration,
    /// Register apps in the background
    pub detached: bool,
}

/// Parse an `ID=VALUE` assignment
///
/// The variable prefix may be left out, so `db_pass=x` sets `$$cap_db_pass`.
pub fn parse_variable_assignment(input: &str) -> std::result::Result<(String, String), String> {
    let (id, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", input))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing variable id in '{}'", input));
    }

    let id = if id.starts_with(VARIABLE_PREFIX) {
        id.to_string()
    } else {
        format!("{}{}", VARIABLE_PREFIX, id)
    };
    Ok((id, value.to_string()))
}
