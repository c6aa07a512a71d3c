// ABOUTME: Error taxonomy for the Nightscout sync pipeline
// ABOUTME: Defines SyncError with structured context and stable ErrorCode values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sync Errors
//!
//! Every fallible operation in the pipeline returns [`SyncResult`]. Fetches
//! never abort the process: a failed window is reported to the orchestrator as
//! one of these variants and the remaining windows keep running.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, machine-readable error codes used in reports and structured logs
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Authorization call failed or returned an unusable token
    AuthFailure,
    /// Network error, timeout, or non-2xx response
    TransportFailure,
    /// Response body did not match the expected envelope
    DecodeFailure,
    /// The fetch was cancelled before it finished
    Cancelled,
    /// The consumer dropped its receiver mid-fetch
    ChannelClosed,
    /// Invalid configuration or construction argument
    ConfigInvalid,
    /// A fetch task panicked or was aborted before reporting
    Internal,
}

impl ErrorCode {
    /// String form matching the serialized representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthFailure => "AUTH_FAILURE",
            Self::TransportFailure => "TRANSPORT_FAILURE",
            Self::DecodeFailure => "DECODE_FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::ChannelClosed => "CHANNEL_CLOSED",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by authorization, fetching, and configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Authorization call failed or returned an unusable token
    #[error("Authorization against {endpoint} failed: {reason}")]
    AuthFailure {
        /// Endpoint the authorization request was sent to (secret omitted)
        endpoint: String,
        /// Why the token could not be obtained
        reason: String,
    },

    /// Fetch call failed: network, timeout, or non-2xx status
    #[error("Request to {url} failed{}: {reason}", status_suffix(.status))]
    TransportFailure {
        /// Request URL without query string
        url: String,
        /// HTTP status when the server answered
        status: Option<u16>,
        /// Underlying transport error or response excerpt
        reason: String,
    },

    /// Response body did not match the expected envelope shape
    #[error("Response from {url} did not match the expected envelope: {reason}")]
    DecodeFailure {
        /// Request URL without query string
        url: String,
        /// Deserializer error message
        reason: String,
    },

    /// The fetch observed its cancellation token before finishing
    #[error("Fetch from {url} was cancelled")]
    Cancelled {
        /// Request URL without query string
        url: String,
    },

    /// The consumer side of an output channel was dropped
    #[error("Output channel for {collection} closed before all records were delivered")]
    ChannelClosed {
        /// Collection whose channel closed
        collection: &'static str,
    },

    /// Invalid configuration or construction argument
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What was wrong
        reason: String,
    },

    /// A fetch task ended without reporting a result
    #[error("Fetch task for {collection} did not complete: {reason}")]
    Internal {
        /// Collection the task was fetching
        collection: &'static str,
        /// Panic or abort description
        reason: String,
    },
}

impl SyncError {
    /// Create an authorization failure
    pub fn auth(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthFailure {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport failure
    pub fn transport(url: impl Into<String>, status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::TransportFailure {
            url: url.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create a decode failure
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Stable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AuthFailure { .. } => ErrorCode::AuthFailure,
            Self::TransportFailure { .. } => ErrorCode::TransportFailure,
            Self::DecodeFailure { .. } => ErrorCode::DecodeFailure,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
            Self::ChannelClosed { .. } => ErrorCode::ChannelClosed,
            Self::Config { .. } => ErrorCode::ConfigInvalid,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// HTTP status attached to a transport failure, if any
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::TransportFailure { status, .. } => *status,
            _ => None,
        }
    }
}

#[allow(clippy::ref_option)] // format args receive fields by reference
fn status_suffix(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |s| format!(" (HTTP {s})"))
}

/// Result alias used across the pipeline
pub type SyncResult<T> = Result<T, SyncError>;
