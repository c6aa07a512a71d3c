// ABOUTME: HTTP client construction with connection pooling and configured timeouts
// ABOUTME: One client is built per run and shared by the authenticator and every fetch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::{Client, ClientBuilder};
use tracing::warn;

use crate::config::HttpClientConfig;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("nightscout-sync/", env!("CARGO_PKG_VERSION"));

/// Create the HTTP client for a sync run
///
/// `reqwest::Client` is internally reference counted, so clones handed to
/// concurrent fetches share one connection pool. Falls back to a default
/// client if the configured builder cannot be constructed.
#[must_use]
pub fn create_client(config: &HttpClientConfig) -> Client {
    ClientBuilder::new()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            Client::new()
        })
}

/// Create a client with default timeouts
#[must_use]
pub fn default_client() -> Client {
    create_client(&HttpClientConfig::default())
}
