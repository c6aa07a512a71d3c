// ABOUTME: Exchanges the Nightscout shared secret for a short-lived bearer token
// ABOUTME: Consumes an unauthenticated session and returns an authenticated one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use nightscout_core::{SyncError, SyncResult};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::session::{Authenticated, Session, Unauthenticated};

/// Body of `GET /api/v2/authorization/request/{secret}`
#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    #[serde(default)]
    token: String,
}

/// Performs the one-time secret-for-token exchange
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: Client,
}

impl Authenticator {
    /// Create an authenticator sharing the run's HTTP client
    #[must_use]
    pub const fn new(http: Client) -> Self {
        Self { http }
    }

    /// Authorize the session and return it in the authenticated state
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AuthFailure`] if:
    /// - the request cannot be sent or times out
    /// - the server answers with a non-2xx status
    /// - the body is not a JSON object with a `token` string
    /// - the token is empty
    pub async fn authorize(
        &self,
        session: Session<Unauthenticated>,
    ) -> SyncResult<Session<Authenticated>> {
        let endpoint = session.endpoint().to_owned();
        info!(endpoint = %endpoint, "Requesting Nightscout bearer token");

        let response = self
            .http
            .get(session.authorization_url())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SyncError::auth(&endpoint, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::auth(&endpoint, format!("failed to read response: {e}")))?;

        if session.verbose() {
            debug!(http.status = status.as_u16(), body.len = body.len(), "Authorization response");
        }

        if !status.is_success() {
            warn!(http.status = status.as_u16(), "Authorization rejected");
            return Err(SyncError::auth(
                &endpoint,
                format!("HTTP {}: {}", status.as_u16(), excerpt(&body)),
            ));
        }

        let parsed: AuthorizationResponse = serde_json::from_str(&body)
            .map_err(|e| SyncError::auth(&endpoint, format!("invalid response body: {e}")))?;

        let token = parsed.token.trim();
        if token.is_empty() {
            return Err(SyncError::auth(&endpoint, "response contained an empty token"));
        }

        info!(endpoint = %endpoint, "Nightscout authorization successful");
        Ok(session.authenticate(token.to_owned()))
    }
}

/// First 200 characters of a response body for error messages
pub(crate) fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let mut out: String = body.chars().take(MAX_CHARS).collect();
    if body.chars().count() > MAX_CHARS {
        out.push('…');
    }
    out
}
