// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, record fixtures, and wiremock helpers for a fake Nightscout site
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `nightscout_sync`

use std::sync::Once;

use nightscout_sync::auth::Authenticator;
use nightscout_sync::http_client::default_client;
use nightscout_sync::session::{Authenticated, Session};
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

/// Shared secret the fake site accepts
pub const SECRET: &str = "abc123";

/// Token the fake site issues
pub const TOKEN: &str = "tok-xyz";

/// Local user stamped onto records
pub const LOCAL_USER: &str = "alice";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Path of the authorization request for `secret`
pub fn authorization_path(secret: &str) -> String {
    format!("/api/v2/authorization/request/{secret}")
}

/// Mount the authorization endpoint returning [`TOKEN`] for [`SECRET`]
pub async fn mount_authorization(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(authorization_path(SECRET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": TOKEN })))
        .mount(server)
        .await;
}

/// Start a fake site, authorize against it, and return the client and session
pub async fn authorized_session(server: &MockServer) -> (Client, Session<Authenticated>) {
    init_test_logging();
    mount_authorization(server).await;
    let http = default_client();
    let session = Session::new(format!("{}/", server.uri()), SECRET, LOCAL_USER, true).unwrap();
    let session = Authenticator::new(http.clone())
        .authorize(session)
        .await
        .unwrap();
    (http, session)
}

/// A v3 envelope around `records`
pub fn envelope(records: Vec<Value>) -> Value {
    json!({ "status": 200, "result": records })
}

/// A device status snapshot uploaded by `device`
pub fn device_status(id: &str, device: &str) -> Value {
    json!({
        "identifier": id,
        "created_at": "2025-03-01T12:00:00.000Z",
        "date": 1_740_830_400_000_i64,
        "device": device,
        "user": "remote-user",
        "uploaderBattery": 87
    })
}

/// A treatment event
pub fn treatment(id: &str, event_type: &str) -> Value {
    json!({
        "identifier": id,
        "created_at": "2025-03-01T12:05:00.000Z",
        "eventType": event_type,
        "insulin": 1.5,
        "enteredBy": "loop"
    })
}
