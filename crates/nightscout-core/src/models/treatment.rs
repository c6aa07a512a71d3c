// ABOUTME: Treatment event record from the Nightscout treatments collection
// ABOUTME: Treatments are never filtered; every record is tagged and forwarded
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{extra_str, lenient_string, SyncRecord};
use crate::constants::api;

/// A treatment event (bolus, carb entry, temp basal, site change, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Treatment {
    /// Local user the record is attributed to
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<String>,
    /// Every other field, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Treatment {
    /// Server-assigned identifier, when the server sent a string
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        extra_str(&self.extra, "identifier")
    }

    /// Nightscout event type, e.g. `Meal Bolus`
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        extra_str(&self.extra, "eventType")
    }
}

impl SyncRecord for Treatment {
    const COLLECTION: &'static str = api::TREATMENTS_COLLECTION;

    fn tag_user(&mut self, user: &str) {
        self.user = Some(user.to_owned());
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}
