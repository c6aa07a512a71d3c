// ABOUTME: Nightscout session state with a typed Unauthenticated -> Authenticated transition
// ABOUTME: Holds endpoint, shared secret, local user identity, verbosity, and the bearer credential
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session
//!
//! A [`Session`] starts out [`Unauthenticated`]. The only way to obtain a
//! `Session<Authenticated>` is through [`crate::auth::Authenticator`], and
//! every fetch requires one, so fetching before authorizing does not compile.
//! The bearer credential is written once during that transition and never
//! mutated afterwards, which makes the authenticated session safe to share
//! across concurrent fetches behind an `Arc`.

use std::fmt;

use nightscout_core::constants::api;
use nightscout_core::{SyncError, SyncResult};
use url::Url;

/// Session state before authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

/// Session state after a successful authorization
#[derive(Clone, PartialEq, Eq)]
pub struct Authenticated {
    bearer: String,
}

impl fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticated")
            .field("bearer", &"[REDACTED]")
            .finish()
    }
}

/// Connection parameters and identity for one Nightscout site
#[derive(Clone, PartialEq, Eq)]
pub struct Session<S = Unauthenticated> {
    endpoint: String,
    shared_secret: String,
    local_user: String,
    verbose: bool,
    state: S,
}

impl<S> fmt::Debug for Session<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("shared_secret", &"[REDACTED]")
            .field("local_user", &self.local_user)
            .field("verbose", &self.verbose)
            .field("state", &self.state)
            .finish()
    }
}

impl Session<Unauthenticated> {
    /// Create an unauthenticated session
    ///
    /// Trailing slashes on `endpoint` are trimmed so paths can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not an absolute
    /// http(s) URL, or if the shared secret or local user is empty
    pub fn new(
        endpoint: impl Into<String>,
        shared_secret: impl Into<String>,
        local_user: impl Into<String>,
        verbose: bool,
    ) -> SyncResult<Self> {
        let endpoint = endpoint.into();
        let shared_secret = shared_secret.into();
        let local_user = local_user.into();

        let parsed = Url::parse(&endpoint)
            .map_err(|e| SyncError::config(format!("invalid endpoint '{endpoint}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SyncError::config(format!(
                "endpoint '{endpoint}' must use http or https"
            )));
        }
        if shared_secret.trim().is_empty() {
            return Err(SyncError::config("shared secret cannot be empty"));
        }
        if local_user.trim().is_empty() {
            return Err(SyncError::config("local user cannot be empty"));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            shared_secret,
            local_user,
            verbose,
            state: Unauthenticated,
        })
    }

    /// URL of the authorization request for this session's shared secret
    #[must_use]
    pub fn authorization_url(&self) -> String {
        format!(
            "{}{}{}",
            self.endpoint,
            api::AUTHORIZATION_REQUEST_PATH,
            urlencoding::encode(&self.shared_secret)
        )
    }

    /// Move to the authenticated state with the issued bearer credential
    pub(crate) fn authenticate(self, bearer: String) -> Session<Authenticated> {
        Session {
            endpoint: self.endpoint,
            shared_secret: self.shared_secret,
            local_user: self.local_user,
            verbose: self.verbose,
            state: Authenticated { bearer },
        }
    }
}

impl Session<Authenticated> {
    /// Bearer credential presented on every fetch
    #[must_use]
    pub fn bearer_credential(&self) -> &str {
        &self.state.bearer
    }

    /// URL of a v3 collection endpoint
    #[must_use]
    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}{}", self.endpoint, api::collection_path(collection))
    }
}

impl<S> Session<S> {
    /// Base endpoint without trailing slash
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Identity stamped onto every emitted record
    #[must_use]
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Whether request/response diagnostics are logged
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}
