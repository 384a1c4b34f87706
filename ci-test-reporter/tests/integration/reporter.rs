// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::{BASE_URL, RecordedRequest, RecordingTransport, TESTS_URL};
use ci_test_reporter::{
    reporter::{
        CiReporter, CiReporterBuilder, FailureCause, FailureDescription, OutcomeReport,
        TestEvent, TestOutcome,
    },
    transport::{ApiMethod, DispatchStats},
};
use pretty_assertions::assert_eq;
use std::{collections::BTreeSet, time::Duration};

fn reporter(transport: &RecordingTransport) -> CiReporter {
    CiReporterBuilder::new(BASE_URL).build(transport.clone())
}

fn assembly_starting(path: &str) -> TestEvent {
    TestEvent::AssemblyStarting {
        assembly_path: path.into(),
    }
}

fn starting(name: &str) -> TestEvent {
    TestEvent::TestStarting {
        display_name: name.to_owned(),
    }
}

fn passed(name: &str, millis: u64) -> TestEvent {
    TestEvent::TestPassed {
        display_name: name.to_owned(),
        execution_time: Duration::from_millis(millis),
        output: None,
    }
}

#[test]
fn start_then_pass() {
    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    for event in [
        assembly_starting("/build/Tests.dll"),
        starting("Suite.CaseA"),
        TestEvent::TestPassed {
            display_name: "Suite.CaseA".to_owned(),
            execution_time: Duration::from_secs_f64(0.5),
            output: None,
        },
    ] {
        reporter.report_event(&event).unwrap();
    }
    let stats = reporter.finish().unwrap();
    assert_eq!(stats, DispatchStats { sent: 2, failed: 0 });

    let file_name = Some("Tests.dll".to_owned());
    assert_eq!(
        transport.requests(),
        [
            RecordedRequest {
                method: ApiMethod::Create,
                url: TESTS_URL.to_owned(),
                body: OutcomeReport::running("Suite.CaseA".to_owned(), file_name.clone()),
            },
            RecordedRequest {
                method: ApiMethod::Update,
                url: TESTS_URL.to_owned(),
                body: OutcomeReport::finished(
                    "Suite.CaseA".to_owned(),
                    file_name,
                    TestOutcome::Passed,
                    Duration::from_millis(500),
                ),
            },
        ],
    );
}

#[test]
fn repeated_names_are_disambiguated() {
    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    reporter
        .report_event(&assembly_starting("/build/Tests.dll"))
        .unwrap();

    // Names compare case-insensitively, but the original casing is kept.
    for name in ["Suite.Theory", "suite.theory", "Suite.Theory"] {
        reporter.report_event(&starting(name)).unwrap();
        reporter.report_event(&passed(name, 1)).unwrap();
    }
    reporter.finish().unwrap();

    let names: Vec<_> = transport
        .requests()
        .into_iter()
        .map(|request| (request.method, request.body.test_name))
        .collect();
    assert_eq!(
        names,
        [
            (ApiMethod::Create, "Suite.Theory".to_owned()),
            (ApiMethod::Update, "Suite.Theory".to_owned()),
            (ApiMethod::Create, "suite.theory 1".to_owned()),
            (ApiMethod::Update, "suite.theory 1".to_owned()),
            (ApiMethod::Create, "Suite.Theory 2".to_owned()),
            (ApiMethod::Update, "Suite.Theory 2".to_owned()),
        ],
    );
}

#[test]
fn skipped_test() {
    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    reporter
        .report_event(&TestEvent::TestSkipped {
            display_name: "Suite.Ignored".to_owned(),
            execution_time: Duration::ZERO,
            reason: Some("requires network".to_owned()),
        })
        .unwrap();
    reporter.finish().unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, ApiMethod::Update);
    assert_eq!(
        requests[0].body,
        OutcomeReport::finished(
            "Suite.Ignored".to_owned(),
            None,
            TestOutcome::Skipped,
            Duration::ZERO,
        ),
    );
}

#[test]
fn failure_chain() {
    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    reporter
        .report_event(&TestEvent::TestFailed {
            display_name: "Suite.CaseB".to_owned(),
            execution_time: Duration::from_millis(1500),
            output: Some("captured".to_owned()),
            failure: FailureDescription::new([
                FailureCause::new("outer failure").with_stack_trace("at outer"),
                FailureCause::new("inner failure"),
                FailureCause::new("root cause").with_stack_trace("at root"),
            ]),
        })
        .unwrap();
    reporter.finish().unwrap();

    let requests = transport.requests();
    let body = &requests[0].body;
    assert_eq!(body.outcome, TestOutcome::Failed);
    assert_eq!(body.duration_milliseconds, Some(1500));
    assert_eq!(
        body.error_message.as_deref(),
        Some("outer failure\n---- inner failure\n---- root cause"),
    );
    assert_eq!(
        body.error_stack_trace.as_deref(),
        Some("at outer\n----- Inner Stack Trace -----\nat root"),
    );
    assert_eq!(body.std_out.as_deref(), Some("captured"));
    assert_eq!(body.std_err, None);
}

#[test]
fn long_output_is_truncated() {
    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    reporter
        .report_event(&TestEvent::TestPassed {
            display_name: "Suite.Chatty".to_owned(),
            execution_time: Duration::from_millis(2),
            output: Some("a".repeat(5000)),
        })
        .unwrap();
    reporter.finish().unwrap();

    let std_out = transport.requests()[0].body.std_out.clone().unwrap();
    assert_eq!(std_out, "a".repeat(4096));
}

#[test]
fn transport_failures_do_not_affect_reporting() {
    let transport = RecordingTransport::failing_on(TestOutcome::Running);
    let reporter = reporter(&transport);
    for name in ["a", "b"] {
        reporter.report_event(&starting(name)).unwrap();
        reporter.report_event(&passed(name, 3)).unwrap();
    }
    let stats = reporter.finish().unwrap();
    assert_eq!(stats, DispatchStats { sent: 2, failed: 2 });

    let outcomes: Vec<_> = transport
        .requests()
        .into_iter()
        .map(|request| (request.body.test_name, request.body.outcome))
        .collect();
    assert_eq!(
        outcomes,
        [
            ("a".to_owned(), TestOutcome::Running),
            ("a".to_owned(), TestOutcome::Passed),
            ("b".to_owned(), TestOutcome::Running),
            ("b".to_owned(), TestOutcome::Passed),
        ],
    );
}

#[test]
fn concurrent_finishes() {
    const THREADS: usize = 10;
    const PER_THREAD: usize = 100;

    let transport = RecordingTransport::new();
    let reporter = reporter(&transport);
    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..PER_THREAD {
                    reporter.report_event(&passed("Suite.Theory", 1)).unwrap();
                }
            });
        }
    });
    let stats = reporter.finish().unwrap();
    assert_eq!(
        stats,
        DispatchStats {
            sent: THREADS * PER_THREAD,
            failed: 0,
        }
    );

    let names: BTreeSet<_> = transport
        .requests()
        .into_iter()
        .map(|request| request.body.test_name)
        .collect();
    let expected: BTreeSet<_> = std::iter::once("Suite.Theory".to_owned())
        .chain((1..THREADS * PER_THREAD).map(|n| format!("Suite.Theory {n}")))
        .collect();
    assert_eq!(names, expected);
}
