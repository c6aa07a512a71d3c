// ABOUTME: Main library entry point for the Nightscout sync pipeline
// ABOUTME: Authenticates against a Nightscout site and streams device status and treatment records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nightscout Sync
//!
//! Pulls device status snapshots and treatment events from a Nightscout site
//! into a local processing pipeline.
//!
//! ## Flow
//!
//! 1. Build a [`session::Session`] from endpoint, shared secret, and local user
//! 2. Exchange the secret for a bearer token with [`auth::Authenticator`]
//! 3. Launch concurrent fetch windows through [`pipeline::SyncPipeline`]
//! 4. Drain the per-collection output channels while awaiting the run report
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nightscout_sync::auth::Authenticator;
//! use nightscout_sync::http_client::default_client;
//! use nightscout_sync::pipeline::{SyncPipeline, SyncPlan};
//! use nightscout_sync::session::Session;
//!
//! # async fn example() -> nightscout_sync::SyncResult<()> {
//! let http = default_client();
//! let session = Session::new("https://ns.example.org", "abc123", "alice", false)?;
//! let session = Authenticator::new(http.clone()).authorize(session).await?;
//!
//! let pipeline = SyncPipeline::new(http, session, 256);
//! let (mut channels, run) = pipeline.start(&SyncPlan::from_counts(100, 100, 50));
//! let consumer = tokio::spawn(async move {
//!     while let Some(status) = channels.device_statuses.recv().await {
//!         println!("{:?}", status.device);
//!     }
//! });
//! let report = run.finish().await;
//! let _ = consumer.await;
//! println!("emitted {} records", report.total_emitted());
//! # Ok(())
//! # }
//! ```

/// Secret-for-token exchange
pub mod auth;

/// Join primitive signalled once per launched fetch
pub mod completion;

/// Environment and CLI configuration
pub mod config;

/// Generic paginated fetch of one collection window
pub mod fetcher;

/// Shared HTTP client construction
pub mod http_client;

/// Structured logging setup
pub mod logging;

/// Concurrent fan-out of fetch windows and run reporting
pub mod pipeline;

/// Session state and the authenticated typestate
pub mod session;

pub use nightscout_core::{
    constants, plan_windows, DeviceStatus, Envelope, ErrorCode, FetchWindow, SyncError,
    SyncRecord, SyncResult, Treatment,
};
