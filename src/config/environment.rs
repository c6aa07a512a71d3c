// ABOUTME: Environment configuration for the sync run: site, credentials, paging, and HTTP timeouts
// ABOUTME: Reads NIGHTSCOUT_* variables with defaults, accepts CLI overrides, and validates the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration for a sync run

use std::env;
use std::str::FromStr;
use std::time::Duration;

use nightscout_core::constants::paging;
use nightscout_core::{SyncError, SyncResult};
use serde::Serialize;
use url::Url;

/// Environment variable names
pub mod vars {
    /// Nightscout site URL
    pub const URL: &str = "NIGHTSCOUT_URL";
    /// Shared API secret exchanged for a bearer token
    pub const API_SECRET: &str = "NIGHTSCOUT_API_SECRET";
    /// Identity stamped onto emitted records
    pub const LOCAL_USER: &str = "NIGHTSCOUT_LOCAL_USER";
    /// Enable request/response diagnostics
    pub const VERBOSE: &str = "NIGHTSCOUT_VERBOSE";
    /// Records per fetch window
    pub const PAGE_SIZE: &str = "NIGHTSCOUT_PAGE_SIZE";
    /// Device status records to synchronize
    pub const DEVICESTATUS_COUNT: &str = "NIGHTSCOUT_DEVICESTATUS_COUNT";
    /// Treatment records to synchronize
    pub const TREATMENTS_COUNT: &str = "NIGHTSCOUT_TREATMENTS_COUNT";
    /// Bounded output channel capacity
    pub const CHANNEL_CAPACITY: &str = "NIGHTSCOUT_CHANNEL_CAPACITY";
    /// HTTP request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "NIGHTSCOUT_HTTP_TIMEOUT_SECS";
    /// HTTP connect timeout in seconds
    pub const HTTP_CONNECT_TIMEOUT_SECS: &str = "NIGHTSCOUT_HTTP_CONNECT_TIMEOUT_SECS";
}

/// Default bounded channel capacity per record type
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HttpClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// TCP/TLS connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a `Duration`
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Everything a sync run needs
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    /// Nightscout site URL
    pub endpoint: String,
    /// Shared API secret
    #[serde(skip)]
    pub shared_secret: String,
    /// Identity stamped onto every emitted record
    pub local_user: String,
    /// Log request/response diagnostics
    pub verbose: bool,
    /// Records per fetch window
    pub page_size: u64,
    /// Device status records to synchronize
    pub devicestatus_count: u64,
    /// Treatment records to synchronize
    pub treatments_count: u64,
    /// Bounded output channel capacity per record type
    pub channel_capacity: usize,
    /// HTTP client timeouts
    pub http: HttpClientConfig,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("endpoint", &self.endpoint)
            .field("shared_secret", &"[REDACTED]")
            .field("local_user", &self.local_user)
            .field("verbose", &self.verbose)
            .field("page_size", &self.page_size)
            .field("devicestatus_count", &self.devicestatus_count)
            .field("treatments_count", &self.treatments_count)
            .field("channel_capacity", &self.channel_capacity)
            .field("http", &self.http)
            .finish()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            shared_secret: String::new(),
            local_user: String::new(),
            verbose: false,
            page_size: paging::DEFAULT_PAGE_SIZE,
            devicestatus_count: paging::DEFAULT_RECORD_COUNT,
            treatments_count: paging::DEFAULT_RECORD_COUNT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            http: HttpClientConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from `NIGHTSCOUT_*` environment variables
    ///
    /// Missing required values are left empty; call [`SyncConfig::validate`]
    /// after applying any CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a numeric or boolean variable is set
    /// but cannot be parsed
    pub fn from_env() -> SyncResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            endpoint: env::var(vars::URL).unwrap_or_default(),
            shared_secret: env::var(vars::API_SECRET).unwrap_or_default(),
            local_user: env::var(vars::LOCAL_USER).unwrap_or_default(),
            verbose: parse_bool_var(vars::VERBOSE)?.unwrap_or(defaults.verbose),
            page_size: parse_var(vars::PAGE_SIZE)?.unwrap_or(defaults.page_size),
            devicestatus_count: parse_var(vars::DEVICESTATUS_COUNT)?
                .unwrap_or(defaults.devicestatus_count),
            treatments_count: parse_var(vars::TREATMENTS_COUNT)?
                .unwrap_or(defaults.treatments_count),
            channel_capacity: parse_var(vars::CHANNEL_CAPACITY)?
                .unwrap_or(defaults.channel_capacity),
            http: HttpClientConfig {
                timeout_secs: parse_var(vars::HTTP_TIMEOUT_SECS)?
                    .unwrap_or(defaults.http.timeout_secs),
                connect_timeout_secs: parse_var(vars::HTTP_CONNECT_TIMEOUT_SECS)?
                    .unwrap_or(defaults.http.connect_timeout_secs),
            },
        })
    }

    /// Check required values and bounds, clamping the page size to the API maximum
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid value
    pub fn validate(mut self) -> SyncResult<Self> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::config(format!(
                "{} (or --url) is required",
                vars::URL
            )));
        }
        let url = Url::parse(&self.endpoint)
            .map_err(|e| SyncError::config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::config(format!(
                "endpoint '{}' must use http or https",
                self.endpoint
            )));
        }
        if self.shared_secret.trim().is_empty() {
            return Err(SyncError::config(format!(
                "{} (or --secret) is required",
                vars::API_SECRET
            )));
        }
        if self.local_user.trim().is_empty() {
            return Err(SyncError::config(format!(
                "{} (or --user) is required",
                vars::LOCAL_USER
            )));
        }
        if self.page_size == 0 {
            return Err(SyncError::config("page size must be greater than 0"));
        }
        if self.channel_capacity == 0 {
            return Err(SyncError::config("channel capacity must be greater than 0"));
        }
        if self.http.timeout_secs == 0 {
            return Err(SyncError::config("HTTP timeout must be greater than 0"));
        }
        self.page_size = self.page_size.min(paging::MAX_PAGE_SIZE);
        Ok(self)
    }
}

fn parse_var<T>(key: &str) -> SyncResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SyncError::config(format!("{key} must be a valid number: {e}"))),
        _ => Ok(None),
    }
}

fn parse_bool_var(key: &str) -> SyncResult<Option<bool>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_flag(&raw)
            .map(Some)
            .ok_or_else(|| SyncError::config(format!("{key} must be true or false"))),
        _ => Ok(None),
    }
}

/// Parse a boolean flag the way the environment usually spells it
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
