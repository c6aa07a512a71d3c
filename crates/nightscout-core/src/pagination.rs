// ABOUTME: Skip/limit fetch windows and the decoded v3 response envelope
// ABOUTME: Builds the sorted pagination query for a single request and plans consecutive windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::constants::{paging, query};
use crate::errors::{SyncError, SyncResult};

/// One paginated request's skip/limit parameters, sorted newest first
///
/// Fields are private so every window goes through [`FetchWindow::new`] or
/// [`plan_windows`], which guarantees a non-zero limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    skip: u64,
    limit: u64,
    sort_field: &'static str,
}

impl FetchWindow {
    /// Create a window sorted descending by `created_at`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `limit` is zero
    pub fn new(skip: u64, limit: u64) -> SyncResult<Self> {
        if limit == 0 {
            return Err(SyncError::config("fetch window limit must be positive"));
        }
        Ok(Self::unchecked(skip, limit))
    }

    const fn unchecked(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit,
            sort_field: paging::DEFAULT_SORT_FIELD,
        }
    }

    /// Number of records to skip
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum number of records to return (never zero)
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Field the server sorts by, descending
    #[must_use]
    pub const fn sort_field(&self) -> &'static str {
        self.sort_field
    }

    /// Query pairs in request order: `skip`, `limit`, then the sort key
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            (query::SKIP, self.skip.to_string()),
            (query::LIMIT, self.limit.to_string()),
            (query::SORT_DESC, self.sort_field.to_owned()),
        ]
    }

    /// Index one past the last record this window can return
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.skip.saturating_add(self.limit)
    }
}

impl Display for FetchWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "skip={} limit={}", self.skip, self.limit)
    }
}

/// Split `total` records into consecutive, non-overlapping windows of `page_size`
///
/// The last window is truncated to the remainder. A zero `total` yields no
/// windows; a zero `page_size` is treated as one.
#[must_use]
pub fn plan_windows(total: u64, page_size: u64) -> Vec<FetchWindow> {
    let page_size = page_size.max(1);
    let mut windows = Vec::new();
    let mut skip = 0;
    while skip < total {
        let limit = page_size.min(total - skip);
        windows.push(FetchWindow::unchecked(skip, limit));
        skip += limit;
    }
    windows
}

/// Decoded v3 response body
///
/// Both `status` and `result` are required; a body missing either is not an
/// envelope and fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Status code echoed by the server
    pub status: i64,
    /// Records in server sort order
    #[serde(rename = "result")]
    pub records: Vec<T>,
}

impl<T> Envelope<T> {
    /// Number of records in the envelope
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the envelope carries no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
