// ABOUTME: Nightscout record models and the per-collection SyncRecord contract
// ABOUTME: Each record kind names its collection, its filter predicate, and how it is tagged
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Record Models
//!
//! The schemas belong to Nightscout and its uploaders, so only the fields the
//! pipeline reads or writes are typed: `device` (read to filter device status
//! records) and `user` (overwritten with the local user before emission).
//! Everything else lands in a flattened map and reaches the consumer
//! unchanged, whatever JSON type an uploader chose for it. A single odd
//! record therefore never fails the decode of its whole window.

mod device_status;
mod treatment;

pub use device_status::DeviceStatus;
pub use treatment::Treatment;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A record kind fetched from one v3 collection
///
/// The generic fetcher is parameterized by this trait: the collection
/// selects the endpoint, [`SyncRecord::accepts`] is the filter predicate, and
/// [`SyncRecord::tag_user`] stamps the local identity before emission.
pub trait SyncRecord: DeserializeOwned + Serialize + Send + Sync + 'static {
    /// v3 collection name (`devicestatus`, `treatments`)
    const COLLECTION: &'static str;

    /// Whether this record should be forwarded to the consumer
    fn accepts(&self) -> bool {
        true
    }

    /// Overwrite the record's `user` field with the local user
    fn tag_user(&mut self, user: &str);

    /// Current `user` field
    fn user(&self) -> Option<&str>;
}

/// Decode an optional string field, treating any non-string value as absent
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// String-valued passthrough field, if present and a string
pub(crate) fn extra_str<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    extra.get(key).and_then(Value::as_str)
}
