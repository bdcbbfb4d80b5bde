//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Runtime settings shared by the binaries.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::flights_query_builder::DEFAULT_ORIGINS;
use crate::flights_search::{DEFAULT_TIMEOUT_SECS, KIWI_API_HOST};

pub const DEFAULT_DESTINATIONS_FILE: &str = "destinations.json";

static LOCATION_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Airport|City|Country):[A-Z0-9]{2,4}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingSecret(&'static str),
    #[error("the gate password must not be empty")]
    EmptyGatePassword,
    #[error("the access token must not be empty")]
    EmptyAccessToken,
    #[error("invalid origin code: {0:?} (expected e.g. Airport:ALC)")]
    InvalidOrigin(String),
    #[error("at least one origin is required")]
    NoOrigins,
}

#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_host: String,
    pub gate_password: String,
    pub destinations_file: PathBuf,
    pub origins: Vec<String>,
    pub timeout_secs: u64,
    pub queries_per_second: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_host: KIWI_API_HOST.to_string(),
            gate_password: String::new(),
            destinations_file: PathBuf::from(DEFAULT_DESTINATIONS_FILE),
            origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            queries_per_second: 1,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("gate_password", &"<redacted>")
            .field("destinations_file", &self.destinations_file)
            .field("origins", &self.origins)
            .field("timeout_secs", &self.timeout_secs)
            .field("queries_per_second", &self.queries_per_second)
            .finish()
    }
}

impl Settings {
    /// Startup check; any error here should stop the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret("KIWI_RAPIDAPI_KEY"));
        }
        if self.gate_password.is_empty() {
            return Err(ConfigError::EmptyGatePassword);
        }
        if self.origins.is_empty() {
            return Err(ConfigError::NoOrigins);
        }
        if let Some(bad) = self.origins.iter().find(|o| !LOCATION_CODE_RE.is_match(o)) {
            return Err(ConfigError::InvalidOrigin(bad.clone()));
        }
        Ok(())
    }
}

/// Startup check for the token HTTP front ends authenticate with.
pub fn check_access_token(token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::EmptyAccessToken);
    }
    Ok(())
}

/// Settings as command-line flags, each backed by an environment variable.
#[cfg(any(feature = "cli", feature = "server"))]
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    /// RapidAPI key for the Kiwi.com API
    #[arg(long, env = "KIWI_RAPIDAPI_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Password callers must give to `/login`
    #[arg(long, env = "WEEKENDER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// JSON file holding the destination selection
    #[arg(long, env = "WEEKENDER_DESTINATIONS_FILE", default_value = DEFAULT_DESTINATIONS_FILE)]
    pub destinations_file: PathBuf,

    /// Comma-separated origin codes, e.g. Airport:ALC,Airport:RMU
    #[arg(long, env = "WEEKENDER_ORIGINS")]
    pub origins: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Outbound API calls allowed per second
    #[arg(long, default_value_t = 1)]
    pub queries_per_second: u32,
}

#[cfg(any(feature = "cli", feature = "server"))]
impl SettingsArgs {
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let origins = match self.origins.as_deref() {
            Some(raw) => parse_origins(raw)?,
            None => Settings::default().origins,
        };
        let settings = Settings {
            api_key: self.api_key,
            gate_password: self.password,
            destinations_file: self.destinations_file,
            origins,
            timeout_secs: self.timeout_secs,
            queries_per_second: self.queries_per_second.max(1),
            ..Default::default()
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Split a comma-separated origin list, e.g. `Airport:ALC,Airport:RMU`.
pub fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|code| {
            if LOCATION_CODE_RE.is_match(code) {
                Ok(code.to_string())
            } else {
                Err(ConfigError::InvalidOrigin(code.to_string()))
            }
        })
        .collect()
}
