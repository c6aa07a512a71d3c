// ABOUTME: Device status snapshot record from the Nightscout devicestatus collection
// ABOUTME: Only OpenAPS uploads are forwarded; every other uploader is filtered out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{extra_str, lenient_string, SyncRecord};
use crate::constants::{api, filters};

/// A device status snapshot (loop state, pump, uploader battery)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Uploading device, e.g. `openaps://rig1`; non-string values read as absent
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub device: Option<String>,
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

impl DeviceStatus {
    /// Whether `device` starts with the OpenAPS prefix (case-sensitive)
    #[must_use]
    pub fn is_openaps(&self) -> bool {
        self.device
            .as_deref()
            .is_some_and(|device| device.starts_with(filters::OPENAPS_DEVICE_PREFIX))
    }

    /// Server-assigned identifier, when the server sent a string
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        extra_str(&self.extra, "identifier")
    }

    /// ISO-8601 creation timestamp, when the server sent a string
    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        extra_str(&self.extra, "created_at")
    }
}

impl SyncRecord for DeviceStatus {
    const COLLECTION: &'static str = api::DEVICESTATUS_COLLECTION;

    fn accepts(&self) -> bool {
        self.is_openaps()
    }

    fn tag_user(&mut self, user: &str) {
        self.user = Some(user.to_owned());
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(device: Option<&str>) -> DeviceStatus {
        DeviceStatus {
            device: device.map(str::to_owned),
            ..DeviceStatus::default()
        }
    }

    #[test]
    fn test_openaps_prefix_filter() {
        assert!(status(Some("openaps://rig1")).accepts());
        assert!(status(Some("openaps-rig2")).accepts());
        assert!(!status(Some("dexcom-g6")).accepts());
        assert!(!status(Some("OpenAPS://rig1")).accepts());
        assert!(!status(Some("loop://openaps")).accepts());
        assert!(!status(None).accepts());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![
            status(Some("openaps://rig1")),
            status(Some("dexcom-g6")),
            status(Some("openaps-rig2")),
            status(None),
        ];
        let once: Vec<_> = records.into_iter().filter(|r| r.accepts()).collect();
        let twice: Vec<_> = once.clone().into_iter().filter(|r| r.accepts()).collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = r#"{"identifier":"ds-1","device":"openaps://rig1","uploaderBattery":87,"user":"remote"}"#;
        let mut record: DeviceStatus = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra.get("uploaderBattery"), Some(&Value::from(87)));
        assert_eq!(record.identifier(), Some("ds-1"));

        record.tag_user("alice");
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["user"], "alice");
        assert_eq!(out["uploaderBattery"], 87);
        assert_eq!(out["device"], "openaps://rig1");
    }

    #[test]
    fn test_unexpected_field_types_still_decode() {
        let json = r#"{"device":42,"user":{"name":"remote"},"date":"yesterday","created_at":17}"#;
        let record: DeviceStatus = serde_json::from_str(json).unwrap();
        assert!(record.device.is_none());
        assert!(record.user.is_none());
        assert!(!record.accepts());
        assert_eq!(record.extra["date"], "yesterday");
        assert_eq!(record.created_at(), None);
    }
}
