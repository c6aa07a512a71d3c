// ABOUTME: Benchmark fixtures generating realistic Nightscout response envelopes
// ABOUTME: Deterministic data so measurements are reproducible across runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Deterministic Nightscout envelope fixtures.

use serde_json::{json, Value};

/// Predefined page sizes for benchmark scenarios
#[derive(Debug, Clone, Copy)]
pub enum PageSize {
    /// Default page (100 records)
    Default,
    /// Maximum page the API serves (1000 records)
    Max,
}

impl PageSize {
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Default => 100,
            Self::Max => 1000,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "100",
            Self::Max => "1000",
        }
    }
}

/// Uploader mix: two thirds OpenAPS rigs, the rest CGM uploaders
fn device_for(index: usize) -> &'static str {
    match index % 3 {
        0 => "openaps://rig1",
        1 => "openaps-rig2",
        _ => "xdrip-js://dexcom-g6",
    }
}

/// Serialized devicestatus envelope with `count` records
#[must_use]
pub fn device_status_envelope(count: usize) -> Vec<u8> {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "identifier": format!("ds-{i:06}"),
                "created_at": "2025-03-01T12:00:00.000Z",
                "date": 1_740_830_400_000_i64 - (i as i64) * 300_000,
                "device": device_for(i),
                "uploaderBattery": 80 + (i % 20),
                "openaps": {
                    "iob": { "iob": 1.25, "basaliob": 0.4 },
                    "suggested": { "bg": 132, "eventualBG": 118, "reason": "COB: 0, Dev: -12" }
                },
                "pump": { "reservoir": 112.5, "battery": { "percent": 74 } }
            })
        })
        .collect();
    serde_json::to_vec(&json!({ "status": 200, "result": records })).unwrap_or_default()
}

/// Serialized treatments envelope with `count` records
#[must_use]
pub fn treatment_envelope(count: usize) -> Vec<u8> {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "identifier": format!("tr-{i:06}"),
                "created_at": "2025-03-01T12:05:00.000Z",
                "eventType": if i % 2 == 0 { "Correction Bolus" } else { "Carb Correction" },
                "insulin": 0.05 * (i % 40) as f64,
                "carbs": (i % 60) as f64,
                "enteredBy": "loop"
            })
        })
        .collect();
    serde_json::to_vec(&json!({ "status": 200, "result": records })).unwrap_or_default()
}
