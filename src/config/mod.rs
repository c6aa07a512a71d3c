// ABOUTME: Configuration module for the sync run
// ABOUTME: Re-exports the environment-driven SyncConfig and HTTP client timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment and CLI-override configuration
pub mod environment;

pub use environment::{HttpClientConfig, SyncConfig, DEFAULT_CHANNEL_CAPACITY};
