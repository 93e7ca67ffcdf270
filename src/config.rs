// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults for sessions built with
//! [`Session::from_config`](crate::Session::from_config).
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_REFRESH_URL` | Token refresh endpoint (`POST`) | Required for `from_config` |
//! | `AUTH_PROFILE_URL` | Current-user profile endpoint (`GET`) | Required for `from_config` |
//! | `AUTH_HTTP_TIMEOUT_SECS` | Per-request HTTP timeout | `15` |
//! | `AUTH_REFRESH_ON_START` | Refresh once when the session starts | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::time::Duration;

use reqwest::Client;
use url::Url;

/// Environment variable name for the token refresh endpoint.
pub const REFRESH_URL_ENV: &str = "AUTH_REFRESH_URL";

/// Environment variable name for the user profile endpoint.
pub const PROFILE_URL_ENV: &str = "AUTH_PROFILE_URL";

/// Environment variable name for the HTTP timeout, in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "AUTH_HTTP_TIMEOUT_SECS";

/// Environment variable name for the initial refresh switch.
pub const REFRESH_ON_START_ENV: &str = "AUTH_REFRESH_ON_START";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default HTTP timeout (15 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Session settings loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub refresh_url: Option<Url>,
    pub profile_url: Option<Url>,
    pub http_timeout: Duration,
    pub refresh_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_url: None,
            profile_url: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            refresh_on_start: true,
        }
    }
}

impl SessionConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Unset and empty variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let url = |var: &'static str| -> Result<Option<Url>, ConfigError> {
            get(var)
                .map(|raw| {
                    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { var, source })
                })
                .transpose()
        };

        let http_timeout = match get(HTTP_TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    var: HTTP_TIMEOUT_ENV,
                    value: raw,
                })?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let refresh_on_start = match get(REFRESH_ON_START_ENV) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                var: REFRESH_ON_START_ENV,
                value: raw,
            })?,
            None => true,
        };

        Ok(Self {
            refresh_url: url(REFRESH_URL_ENV)?,
            profile_url: url(PROFILE_URL_ENV)?,
            http_timeout,
            refresh_on_start,
        })
    }

    /// Build the HTTP client used by the session and its collaborators.
    pub fn http_client(&self) -> Result<Client, ConfigError> {
        Ok(Client::builder().timeout(self.http_timeout).build()?)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
