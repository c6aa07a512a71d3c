// ABOUTME: Core types and constants for the Nightscout sync pipeline
// ABOUTME: Foundation crate with error handling, fetch windows, envelopes, and record models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nightscout Core
//!
//! Foundation crate providing shared types and constants for the Nightscout
//! sync pipeline. This crate has no I/O of its own; the HTTP side lives in the
//! `nightscout-sync` crate and builds on the types defined here.
//!
//! ## Modules
//!
//! - **errors**: `SyncError` taxonomy (auth, transport, decode, cancellation) and `ErrorCode`
//! - **constants**: API paths, query parameter names, and paging limits
//! - **pagination**: `FetchWindow` skip/limit/sort parameters and the response `Envelope`
//! - **models**: `DeviceStatus` and `Treatment` records and the `SyncRecord` trait

/// Unified error handling for authorization, transport, and decoding failures
pub mod errors;

/// API paths, query parameter names, and paging limits
pub mod constants;

/// Skip/limit fetch windows and the decoded response envelope
pub mod pagination;

/// Nightscout record models and the per-collection `SyncRecord` contract
pub mod models;

pub use errors::{ErrorCode, SyncError, SyncResult};
pub use models::{DeviceStatus, SyncRecord, Treatment};
pub use pagination::{plan_windows, Envelope, FetchWindow};
