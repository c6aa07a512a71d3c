// ABOUTME: Completion group that lets the orchestrator wait for every launched fetch to finish
// ABOUTME: Registration hands out a guard whose Drop signals completion exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Completion Group
//!
//! A counter-based join primitive. The orchestrator calls
//! [`CompletionGroup::register`] before launching each fetch and moves the
//! returned [`CompletionGuard`] into that fetch. The guard decrements the group
//! when it is dropped, so completion is signalled on success, on early error
//! return, on panic unwinding, and when the task is aborted.
//!
//! ```rust,no_run
//! use nightscout_sync::completion::CompletionGroup;
//!
//! # async fn example() {
//! let group = CompletionGroup::new();
//! for _ in 0..4 {
//!     let guard = group.register();
//!     tokio::spawn(async move {
//!         // ... fetch ...
//!         drop(guard);
//!     });
//! }
//! group.wait().await;
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct GroupState {
    pending: AtomicUsize,
    registered: AtomicUsize,
    completed: AtomicUsize,
    notify: Notify,
}

/// Shared counter of in-flight fetches
#[derive(Debug, Clone, Default)]
pub struct CompletionGroup {
    state: Arc<GroupState>,
}

impl CompletionGroup {
    /// Create an empty group
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one fetch; the guard must be moved into it
    #[must_use = "dropping the guard immediately signals completion"]
    pub fn register(&self) -> CompletionGuard {
        self.state.registered.fetch_add(1, Ordering::SeqCst);
        self.state.pending.fetch_add(1, Ordering::SeqCst);
        CompletionGuard {
            state: Some(Arc::clone(&self.state)),
        }
    }

    /// Number of registered fetches that have not finished
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    /// Total number of registrations since creation
    #[must_use]
    pub fn registered(&self) -> usize {
        self.state.registered.load(Ordering::SeqCst)
    }

    /// Total number of completion signals since creation
    #[must_use]
    pub fn completed(&self) -> usize {
        self.state.completed.load(Ordering::SeqCst)
    }

    /// Wait until every registered fetch has signalled completion
    ///
    /// Returns immediately when nothing is pending.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking the counter so a concurrent
            // final `done` cannot slip between the check and the await.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Proof of registration; signals completion once when done or dropped
#[derive(Debug)]
pub struct CompletionGuard {
    state: Option<Arc<GroupState>>,
}

impl CompletionGuard {
    /// Signal completion now instead of at drop
    pub fn done(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(state) = self.state.take() {
            state.completed.fetch_add(1, Ordering::SeqCst);
            if state.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                state.notify.notify_waiters();
            }
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_on_empty_group_returns_immediately() {
        let group = CompletionGroup::new();
        tokio::time::timeout(Duration::from_secs(1), group.wait())
            .await
            .unwrap();
        assert_eq!(group.pending(), 0);
    }

    #[test]
    fn test_done_and_drop_signal_exactly_once() {
        let group = CompletionGroup::new();
        let first = group.register();
        let second = group.register();
        assert_eq!(group.pending(), 2);
        assert_eq!(group.registered(), 2);

        first.done();
        assert_eq!(group.pending(), 1);
        assert_eq!(group.completed(), 1);

        drop(second);
        assert_eq!(group.pending(), 0);
        assert_eq!(group.completed(), 2);
    }

    #[tokio::test]
    async fn test_wait_resolves_after_all_tasks_finish() {
        let group = CompletionGroup::new();
        for i in 0..16_u64 {
            let guard = group.register();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(i % 4)).await;
                drop(guard);
            });
        }
        tokio::time::timeout(Duration::from_secs(5), group.wait())
            .await
            .unwrap();
        assert_eq!(group.completed(), 16);
        assert_eq!(group.pending(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_still_signals() {
        let group = CompletionGroup::new();
        let guard = group.register();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("fetch blew up");
        });
        assert!(handle.await.is_err());
        assert_eq!(group.completed(), 1);
        group.wait().await;
    }

    #[tokio::test]
    async fn test_aborted_task_still_signals() {
        let group = CompletionGroup::new();
        let guard = group.register();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(group.completed(), 1);
        assert_eq!(group.pending(), 0);
    }
}
