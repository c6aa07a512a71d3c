// ABOUTME: Generic paginated fetch of one Nightscout v3 collection window into an output channel
// ABOUTME: Filters and tags records per SyncRecord kind and always releases its completion guard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Paginated Fetcher
//!
//! One invocation issues exactly one `GET /api/v3/{collection}` for one
//! [`FetchWindow`], decodes the [`Envelope`], drops records rejected by
//! [`SyncRecord::accepts`], stamps the local user onto the rest, and pushes
//! them onto the output channel in response order.
//!
//! The two collections differ only in their [`SyncRecord`] implementation:
//!
//! | Kind           | Path                   | Filter                     |
//! |----------------|------------------------|----------------------------|
//! | `DeviceStatus` | `/api/v3/devicestatus` | `device` starts `openaps`  |
//! | `Treatment`    | `/api/v3/treatments`   | none                       |
//!
//! ## Completion
//!
//! [`PaginatedFetcher::fetch`] takes ownership of a [`CompletionGuard`] and
//! holds it for the whole call, so the completion group is signalled exactly
//! once on every exit path: success, empty page, transport or decode error,
//! cancellation, or a closed channel.

use std::sync::Arc;

use nightscout_core::{
    DeviceStatus, Envelope, FetchWindow, SyncError, SyncRecord, SyncResult, Treatment,
};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::auth::excerpt;
use crate::completion::CompletionGuard;
use crate::session::{Authenticated, Session};

/// Issues paginated fetches on behalf of an authenticated session
///
/// Cheap to clone: the HTTP client and the session are both shared.
#[derive(Debug, Clone)]
pub struct PaginatedFetcher {
    http: Client,
    session: Arc<Session<Authenticated>>,
}

impl PaginatedFetcher {
    /// Create a fetcher; requiring `Session<Authenticated>` guarantees authorization happened first
    #[must_use]
    pub const fn new(http: Client, session: Arc<Session<Authenticated>>) -> Self {
        Self { http, session }
    }

    /// Fetch one window of `R` records into `sink`
    ///
    /// Returns the number of records emitted.
    ///
    /// # Errors
    ///
    /// - [`SyncError::TransportFailure`] on network error, timeout, or non-2xx status
    /// - [`SyncError::DecodeFailure`] if the body is not an envelope of `R`
    /// - [`SyncError::Cancelled`] if `cancel` fires before the fetch finishes
    /// - [`SyncError::ChannelClosed`] if the consumer dropped its receiver
    pub async fn fetch<R: SyncRecord>(
        &self,
        window: FetchWindow,
        sink: mpsc::Sender<R>,
        completion: CompletionGuard,
        cancel: CancellationToken,
    ) -> SyncResult<usize> {
        let _completion = completion;
        let span = info_span!(
            "fetch",
            collection = R::COLLECTION,
            skip = window.skip(),
            limit = window.limit(),
            request_id = %Uuid::new_v4(),
        );
        let result = self
            .fetch_window(window, &sink, &cancel)
            .instrument(span.clone())
            .await;
        if let Err(ref e) = result {
            span.in_scope(|| warn!(error.code = %e.code(), error = %e, "Fetch window failed"));
        }
        result
    }

    /// Fetch one window of device status snapshots, keeping only OpenAPS uploads
    ///
    /// # Errors
    ///
    /// See [`PaginatedFetcher::fetch`]
    pub async fn fetch_device_statuses(
        &self,
        window: FetchWindow,
        sink: mpsc::Sender<DeviceStatus>,
        completion: CompletionGuard,
        cancel: CancellationToken,
    ) -> SyncResult<usize> {
        self.fetch(window, sink, completion, cancel).await
    }

    /// Fetch one window of treatments; every record is emitted
    ///
    /// # Errors
    ///
    /// See [`PaginatedFetcher::fetch`]
    pub async fn fetch_treatments(
        &self,
        window: FetchWindow,
        sink: mpsc::Sender<Treatment>,
        completion: CompletionGuard,
        cancel: CancellationToken,
    ) -> SyncResult<usize> {
        self.fetch(window, sink, completion, cancel).await
    }

    async fn fetch_window<R: SyncRecord>(
        &self,
        window: FetchWindow,
        sink: &mpsc::Sender<R>,
        cancel: &CancellationToken,
    ) -> SyncResult<usize> {
        let url = self.session.collection_url(R::COLLECTION);
        info!("Loading {} from Nightscout, {window}", R::COLLECTION);

        let body = self.get_page(&url, window, cancel).await?;
        let envelope: Envelope<R> = serde_json::from_slice(&body)
            .map_err(|e| SyncError::decode(&url, e.to_string()))?;

        let received = envelope.len();
        let local_user = self.session.local_user();
        let mut emitted = 0_usize;

        for mut record in envelope.records {
            if !record.accepts() {
                trace!("Dropping record rejected by {} filter", R::COLLECTION);
                continue;
            }
            record.tag_user(local_user);
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SyncError::cancelled(&url)),
                sent = sink.send(record) => {
                    sent.map_err(|_| SyncError::ChannelClosed { collection: R::COLLECTION })?;
                }
            }
            emitted += 1;
        }

        info!(
            envelope.status = envelope.status,
            records.received = received,
            records.emitted = emitted,
            "Fetch window complete"
        );
        Ok(emitted)
    }

    /// Send the GET and return the raw body of a 2xx response
    async fn get_page(
        &self,
        url: &str,
        window: FetchWindow,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<u8>> {
        let request = self
            .http
            .get(url)
            .query(&window.query_pairs())
            .bearer_auth(self.session.bearer_credential())
            .header(ACCEPT, "application/json");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SyncError::cancelled(url)),
            response = request.send() => response.map_err(|e| transport_error(url, &e))?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SyncError::cancelled(url)),
            body = response.bytes() => body.map_err(|e| transport_error(url, &e))?,
        };

        if self.session.verbose() {
            debug!(
                http.status = status.as_u16(),
                body.len = body.len(),
                body = %excerpt(&String::from_utf8_lossy(&body)),
                "Response"
            );
        }

        if !status.is_success() {
            return Err(SyncError::transport(
                url,
                Some(status.as_u16()),
                excerpt(&String::from_utf8_lossy(&body)),
            ));
        }

        Ok(body.to_vec())
    }
}

fn transport_error(url: &str, error: &reqwest::Error) -> SyncError {
    let reason = if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    };
    SyncError::transport(url, error.status().map(|s| s.as_u16()), reason)
}
