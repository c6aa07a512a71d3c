// ABOUTME: Orchestrates concurrent fetch windows for both collections over shared output channels
// ABOUTME: Registers every fetch with its run's completion group and reports per-window outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sync Pipeline
//!
//! [`SyncPipeline::start`] launches one task per planned window and returns
//! the receiving ends of the two output channels together with a [`SyncRun`].
//! The consumer drains the receivers while the caller awaits
//! [`SyncRun::finish`], which waits on that run's completion group, closes
//! both channels, and returns a [`SyncReport`]. Every run gets its own group,
//! so overlapping runs on one pipeline never wait on each other. A failed window never prevents the
//! others from completing; partial success shows up in the report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nightscout_core::constants::api;
use nightscout_core::{
    plan_windows, DeviceStatus, FetchWindow, SyncError, SyncRecord, SyncResult, Treatment,
};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::completion::CompletionGroup;
use crate::fetcher::PaginatedFetcher;
use crate::session::{Authenticated, Session};

/// Windows to fetch for each collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Device status windows
    pub device_statuses: Vec<FetchWindow>,
    /// Treatment windows
    pub treatments: Vec<FetchWindow>,
}

impl SyncPlan {
    /// Plan consecutive windows covering the requested record counts
    #[must_use]
    pub fn from_counts(devicestatus_count: u64, treatments_count: u64, page_size: u64) -> Self {
        Self {
            device_statuses: plan_windows(devicestatus_count, page_size),
            treatments: plan_windows(treatments_count, page_size),
        }
    }

    /// Total number of fetches this plan launches
    #[must_use]
    pub fn len(&self) -> usize {
        self.device_statuses.len() + self.treatments.len()
    }

    /// Whether the plan launches nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving ends of the per-collection output channels
#[derive(Debug)]
pub struct SyncChannels {
    /// Filtered, tagged device status records
    pub device_statuses: mpsc::Receiver<DeviceStatus>,
    /// Tagged treatment records
    pub treatments: mpsc::Receiver<Treatment>,
}

/// Result of one fetch window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Collection the window belongs to
    pub collection: &'static str,
    /// Skip/limit parameters of the request
    pub window: FetchWindow,
    /// Records emitted, or why the window failed
    pub result: SyncResult<usize>,
}

impl WindowOutcome {
    /// Whether the window completed without error
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-collection totals for the summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// Windows launched
    pub windows: usize,
    /// Windows that failed
    pub failed: usize,
    /// Records emitted
    pub emitted: usize,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// When the first fetch was launched
    pub started_at: DateTime<Utc>,
    /// When the last fetch signalled completion
    pub finished_at: DateTime<Utc>,
    /// One entry per launched window, in launch order
    pub outcomes: Vec<WindowOutcome>,
}

impl SyncReport {
    /// Windows that completed without error
    pub fn succeeded(&self) -> impl Iterator<Item = &WindowOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Windows that failed, with their errors
    pub fn failed(&self) -> impl Iterator<Item = (&WindowOutcome, &SyncError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }

    /// Records emitted across all windows
    #[must_use]
    pub fn total_emitted(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    /// Totals for one collection
    #[must_use]
    pub fn summary_for(&self, collection: &str) -> CollectionSummary {
        self.outcomes
            .iter()
            .filter(|o| o.collection == collection)
            .fold(CollectionSummary::default(), |mut acc, o| {
                acc.windows += 1;
                match &o.result {
                    Ok(n) => acc.emitted += n,
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }

    /// Whether every window succeeded
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(WindowOutcome::is_success)
    }

    /// Wall-clock duration of the run
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

type PendingWindow = (&'static str, FetchWindow, JoinHandle<SyncResult<usize>>);

/// Launched fetches awaiting completion
#[derive(Debug)]
pub struct SyncRun {
    completion: CompletionGroup,
    pending: Vec<PendingWindow>,
    device_statuses: Option<mpsc::Sender<DeviceStatus>>,
    treatments: Option<mpsc::Sender<Treatment>>,
    started_at: DateTime<Utc>,
}

impl SyncRun {
    /// Number of windows launched
    #[must_use]
    pub fn launched(&self) -> usize {
        self.pending.len()
    }

    /// Completion group holding exactly this run's fetches
    #[must_use]
    pub const fn completion(&self) -> &CompletionGroup {
        &self.completion
    }

    /// Wait for every fetch to signal completion, close the channels, and report
    ///
    /// The receivers returned alongside this run must be drained concurrently;
    /// a full bounded channel otherwise stalls the fetches feeding it.
    pub async fn finish(mut self) -> SyncReport {
        self.completion.wait().await;
        // Every fetch has released its guard: no more sends can happen, so
        // dropping the originals lets the consumer observe end-of-stream.
        self.device_statuses.take();
        self.treatments.take();
        let finished_at = Utc::now();

        let mut outcomes = Vec::with_capacity(self.pending.len());
        for (collection, window, handle) in self.pending {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SyncError::Internal {
                    collection,
                    reason: e.to_string(),
                }),
            };
            outcomes.push(WindowOutcome {
                collection,
                window,
                result,
            });
        }

        let report = SyncReport {
            started_at: self.started_at,
            finished_at,
            outcomes,
        };
        info!(
            windows = report.outcomes.len(),
            failed = report.failed().count(),
            records.emitted = report.total_emitted(),
            duration_ms = report.duration().num_milliseconds(),
            "Sync run finished"
        );
        report
    }
}

/// Launches fetch windows for an authenticated session
#[derive(Debug, Clone)]
pub struct SyncPipeline {
    fetcher: PaginatedFetcher,
    cancel: CancellationToken,
    channel_capacity: usize,
}

impl SyncPipeline {
    /// Create a pipeline; `channel_capacity` bounds each output channel (minimum 1)
    #[must_use]
    pub fn new(http: Client, session: Session<Authenticated>, channel_capacity: usize) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(http, Arc::new(session)),
            cancel: CancellationToken::new(),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Token that cancels every fetch launched by this pipeline
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch every window in `plan` concurrently
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use = "the run must be finished and the channels drained"]
    pub fn start(&self, plan: &SyncPlan) -> (SyncChannels, SyncRun) {
        let (ds_tx, ds_rx) = mpsc::channel(self.channel_capacity);
        let (tr_tx, tr_rx) = mpsc::channel(self.channel_capacity);
        let started_at = Utc::now();

        info!(
            devicestatus.windows = plan.device_statuses.len(),
            treatments.windows = plan.treatments.len(),
            "Launching fetch windows"
        );

        let completion = CompletionGroup::new();
        let mut pending = Vec::with_capacity(plan.len());
        self.launch(&plan.device_statuses, &ds_tx, &completion, &mut pending);
        self.launch(&plan.treatments, &tr_tx, &completion, &mut pending);

        let run = SyncRun {
            completion,
            pending,
            device_statuses: Some(ds_tx),
            treatments: Some(tr_tx),
            started_at,
        };
        let channels = SyncChannels {
            device_statuses: ds_rx,
            treatments: tr_rx,
        };
        (channels, run)
    }

    fn launch<R: SyncRecord>(
        &self,
        windows: &[FetchWindow],
        sink: &mpsc::Sender<R>,
        completion: &CompletionGroup,
        pending: &mut Vec<PendingWindow>,
    ) {
        for &window in windows {
            let guard = completion.register();
            let fetcher = self.fetcher.clone();
            let sink = sink.clone();
            let cancel = self.cancel.child_token();
            debug!(collection = R::COLLECTION, %window, "Launching fetch");
            let handle =
                tokio::spawn(async move { fetcher.fetch(window, sink, guard, cancel).await });
            pending.push((R::COLLECTION, window, handle));
        }
    }

    /// Cancel every in-flight fetch; each still signals completion
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Lifecycle hook; connections are pooled per client and need no explicit release
    pub fn shutdown(&self) {
        debug!("Sync pipeline shut down");
    }
}

/// Collection names in report order
pub const COLLECTIONS: [&str; 2] = [api::DEVICESTATUS_COLLECTION, api::TREATMENTS_COLLECTION];

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(collection: &'static str, skip: u64, result: SyncResult<usize>) -> WindowOutcome {
        WindowOutcome {
            collection,
            window: FetchWindow::new(skip, 10).unwrap(),
            result,
        }
    }

    #[test]
    fn test_plan_from_counts() {
        let plan = SyncPlan::from_counts(25, 10, 10);
        assert_eq!(plan.device_statuses.len(), 3);
        assert_eq!(plan.treatments.len(), 1);
        assert_eq!(plan.len(), 4);
        assert!(SyncPlan::from_counts(0, 0, 10).is_empty());
    }

    #[test]
    fn test_report_represents_partial_success() {
        let now = Utc::now();
        let report = SyncReport {
            started_at: now,
            finished_at: now,
            outcomes: vec![
                outcome(api::DEVICESTATUS_COLLECTION, 0, Ok(4)),
                outcome(
                    api::DEVICESTATUS_COLLECTION,
                    10,
                    Err(SyncError::transport("u", Some(500), "boom")),
                ),
                outcome(api::TREATMENTS_COLLECTION, 0, Ok(7)),
            ],
        };

        assert!(!report.is_complete_success());
        assert_eq!(report.succeeded().count(), 2);
        assert_eq!(report.total_emitted(), 11);

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0.window.skip(), 10);
        assert_eq!(failed[0].1.http_status(), Some(500));

        let ds = report.summary_for(api::DEVICESTATUS_COLLECTION);
        assert_eq!((ds.windows, ds.failed, ds.emitted), (2, 1, 4));
        let tr = report.summary_for(api::TREATMENTS_COLLECTION);
        assert_eq!((tr.windows, tr.failed, tr.emitted), (1, 0, 7));
    }
}
