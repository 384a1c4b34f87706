// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for [`HttpTransport`] against a mock reporting API.

use ci_test_reporter::{
    errors::TransportError,
    reporter::{CiReporterBuilder, OutcomeReport, TestEvent, TestOutcome},
    transport::{ApiMethod, ApiTransport, DispatchStats, HttpTransport},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::{net::TcpListener, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(10))
}

/// Runs blocking transport calls off the async runtime.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task didn't panic")
}

#[tokio::test]
async fn create_and_update_methods() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tests"))
        .and(body_json(json!({
            "testName": "Suite.CaseA",
            "fileName": "Tests.dll",
            "testFramework": "libtest",
            "outcome": "Running",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/tests"))
        .and(body_json(json!({
            "testName": "Suite.CaseA",
            "fileName": "Tests.dll",
            "testFramework": "libtest",
            "outcome": "Passed",
            "durationMilliseconds": 500,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/api/tests", server.uri());
    blocking(move || {
        let transport = transport();
        let file_name = Some("Tests.dll".to_owned());
        let running = OutcomeReport::running("Suite.CaseA".to_owned(), file_name.clone());
        transport.send(ApiMethod::Create, &url, &running).unwrap();
        let passed = OutcomeReport::finished(
            "Suite.CaseA".to_owned(),
            file_name,
            TestOutcome::Passed,
            Duration::from_millis(500),
        );
        transport.send(ApiMethod::Update, &url, &passed).unwrap();
    })
    .await;

    server.verify().await;

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    for request in &requests {
        let content_type = request
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok());
        assert!(
            content_type.is_some_and(|content_type| content_type.starts_with("application/json")),
            "content type is JSON: {content_type:?}",
        );
    }
}

#[tokio::test]
async fn error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tests"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/api/tests", server.uri());
    let request_url = url.clone();
    let error = blocking(move || {
        let report = OutcomeReport::running("a".to_owned(), None);
        transport()
            .send(ApiMethod::Create, &request_url, &report)
            .unwrap_err()
    })
    .await;
    server.verify().await;

    match error {
        TransportError::Status {
            method,
            url: error_url,
            status,
        } => {
            assert_eq!(method, ApiMethod::Create);
            assert_eq!(error_url, url);
            assert_eq!(status, 500);
        }
        other => panic!("expected a status error, found {other:?}"),
    }
}

#[test]
fn connection_refused() {
    // Bind and immediately drop a listener to find a port with nothing listening on it.
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let url = format!("http://{addr}/api/tests");

    let report = OutcomeReport::running("a".to_owned(), None);
    let error = transport()
        .send(ApiMethod::Update, &url, &report)
        .unwrap_err();
    assert!(
        matches!(error, TransportError::Request { method: ApiMethod::Update, .. }),
        "expected a request error, found {error:?}",
    );
}

#[tokio::test]
async fn reporter_over_http() {
    let server = MockServer::start().await;
    Mock::given(path("/api/tests"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    // The reporter strips the trailing slash.
    let base_url = format!("{}/", server.uri());
    let stats = blocking(move || {
        let reporter = CiReporterBuilder::new(base_url).build(transport());
        let events = [
            TestEvent::AssemblyStarting {
                assembly_path: "/build/Tests.dll".into(),
            },
            TestEvent::TestStarting {
                display_name: "Suite.CaseA".to_owned(),
            },
            TestEvent::TestSkipped {
                display_name: "Suite.CaseA".to_owned(),
                execution_time: Duration::ZERO,
                reason: None,
            },
        ];
        for event in &events {
            reporter.report_event(event).unwrap();
        }
        reporter.finish().unwrap()
    })
    .await;
    assert_eq!(stats, DispatchStats { sent: 2, failed: 0 });
    server.verify().await;

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    let summary: Vec<_> = requests
        .iter()
        .map(|request| {
            let body: Value = request.body_json().unwrap();
            (request.method.to_string(), body)
        })
        .collect();
    assert_eq!(
        summary,
        [
            (
                "POST".to_owned(),
                json!({
                    "testName": "Suite.CaseA",
                    "fileName": "Tests.dll",
                    "testFramework": "libtest",
                    "outcome": "Running",
                }),
            ),
            (
                "PUT".to_owned(),
                json!({
                    "testName": "Suite.CaseA",
                    "fileName": "Tests.dll",
                    "testFramework": "libtest",
                    "outcome": "Skipped",
                    "durationMilliseconds": 0,
                }),
            ),
        ],
    );
}
