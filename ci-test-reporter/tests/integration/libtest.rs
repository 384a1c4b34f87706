// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::{BASE_URL, RecordingTransport};
use ci_test_reporter::{
    libtest::LibtestEventParser,
    reporter::{CiReporterBuilder, TestEvent, TestOutcome},
    transport::ApiMethod,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

static LIBTEST_OUTPUT: &str = indoc! {r#"
    { "type": "suite", "event": "started", "test_count": 4 }
    { "type": "test", "event": "started", "name": "tests::adds" }
    { "type": "test", "name": "tests::adds", "event": "ok", "exec_time": 0.0021 }
    { "type": "test", "event": "started", "name": "tests::slow" }
    { "type": "test", "name": "tests::slow", "event": "ignored", "message": "takes too long" }
    { "type": "test", "event": "started", "name": "tests::divides" }
    { "type": "test", "name": "tests::divides", "event": "failed", "exec_time": 1.5, "stdout": "thread 'tests::divides' panicked at src/lib.rs:20:5:\nattempt to divide by zero\nnote: run with `RUST_BACKTRACE=1` environment variable to display a backtrace\n" }

    { "type": "suite", "event": "failed", "passed": 1, "failed": 1, "ignored": 1, "measured": 0, "filtered_out": 0, "exec_time": 1.6 }
"#};

#[test]
fn libtest_stream_to_reports() {
    let transport = RecordingTransport::new();
    let reporter = CiReporterBuilder::new(BASE_URL).build(transport.clone());
    reporter
        .report_event(&TestEvent::AssemblyStarting {
            assembly_path: "target/debug/deps/my_crate-0123abcd".into(),
        })
        .unwrap();

    let mut parser = LibtestEventParser::new();
    for line in LIBTEST_OUTPUT.lines() {
        if let Some(event) = parser.parse_line(line).unwrap() {
            reporter.report_event(&event).unwrap();
        }
    }
    reporter.finish().unwrap();

    let requests = transport.requests();
    let summary: Vec<_> = requests
        .iter()
        .map(|request| {
            (
                request.method,
                request.body.test_name.as_str(),
                request.body.outcome,
                request.body.duration_milliseconds,
            )
        })
        .collect();
    assert_eq!(
        summary,
        [
            (ApiMethod::Create, "tests::adds", TestOutcome::Running, None),
            (ApiMethod::Update, "tests::adds", TestOutcome::Passed, Some(2)),
            (ApiMethod::Create, "tests::slow", TestOutcome::Running, None),
            (ApiMethod::Update, "tests::slow", TestOutcome::Skipped, Some(0)),
            (ApiMethod::Create, "tests::divides", TestOutcome::Running, None),
            (
                ApiMethod::Update,
                "tests::divides",
                TestOutcome::Failed,
                Some(1500)
            ),
        ],
    );

    for request in &requests {
        assert_eq!(
            request.body.file_name.as_deref(),
            Some("my_crate-0123abcd")
        );
    }

    let failed = &requests[5].body;
    assert_eq!(
        failed.error_message.as_deref(),
        Some("attempt to divide by zero")
    );
    assert_eq!(failed.error_stack_trace.as_deref(), Some("src/lib.rs:20:5"));
    assert!(
        failed
            .std_out
            .as_deref()
            .is_some_and(|std_out| std_out.contains("panicked at src/lib.rs:20:5")),
    );
}
