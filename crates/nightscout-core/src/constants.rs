// ABOUTME: Nightscout API paths, query parameter names, and paging limits
// ABOUTME: Shared between the fetcher, the window planner, and configuration validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// API paths on the remote Nightscout service
pub mod api {
    /// Prefix of the v2 authorization endpoint; the shared secret is appended as a path segment
    pub const AUTHORIZATION_REQUEST_PATH: &str = "/api/v2/authorization/request/";

    /// Prefix of every v3 collection endpoint
    pub const V3_PREFIX: &str = "/api/v3/";

    /// Device status collection name
    pub const DEVICESTATUS_COLLECTION: &str = "devicestatus";

    /// Treatments collection name
    pub const TREATMENTS_COLLECTION: &str = "treatments";

    /// Build the v3 path for a collection (`/api/v3/{collection}`)
    #[must_use]
    pub fn collection_path(collection: &str) -> String {
        format!("{V3_PREFIX}{collection}")
    }
}

/// Query parameter names understood by the v3 API
pub mod query {
    /// Number of records to skip
    pub const SKIP: &str = "skip";

    /// Maximum number of records to return
    pub const LIMIT: &str = "limit";

    /// Descending sort key parameter
    pub const SORT_DESC: &str = "sort$desc";
}

/// Paging defaults and bounds
pub mod paging {
    /// Field every fetch window sorts by
    pub const DEFAULT_SORT_FIELD: &str = "created_at";

    /// Default number of records requested per window
    pub const DEFAULT_PAGE_SIZE: u64 = 100;

    /// Upper bound for a single window; the v3 API rejects larger limits
    pub const MAX_PAGE_SIZE: u64 = 1000;

    /// Default number of records of each collection to synchronize
    pub const DEFAULT_RECORD_COUNT: u64 = 1000;
}

/// Record filtering
pub mod filters {
    /// Device status records are kept only when `device` starts with this prefix
    pub const OPENAPS_DEVICE_PREFIX: &str = "openaps";
}
