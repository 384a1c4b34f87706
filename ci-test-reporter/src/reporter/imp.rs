// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relays test events to the reporting API.
//!
//! The main structure in this module is [`CiReporter`].

use super::{NameRegistry, OutcomeReport, TestEvent, TestEventHandler, TestOutcome};
use crate::{
    errors::{DispatcherError, WriteEventError},
    transport::{ApiDispatcher, ApiMethod, ApiRequest, ApiTransport, DispatchStats, TESTS_PATH},
};
use camino::Utf8Path;
use std::{sync::OnceLock, time::Duration};
use tracing::warn;

/// Builder for a [`CiReporter`].
pub struct CiReporterBuilder {
    base_url: String,
    forward_to: Option<Box<dyn TestEventHandler>>,
}

impl CiReporterBuilder {
    /// Creates a new builder reporting to the API at `base_url`.
    ///
    /// Trailing slashes are stripped from `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            forward_to: None,
        }
    }

    /// Sets a handler that every event is forwarded to after it has been reported, for example a
    /// [`DisplayReporter`](super::DisplayReporter).
    pub fn set_forward_to(&mut self, handler: impl TestEventHandler + 'static) -> &mut Self {
        self.forward_to = Some(Box::new(handler));
        self
    }

    /// Creates the reporter, spawning a dispatcher that sends requests through `transport`.
    pub fn build(self, transport: impl ApiTransport) -> CiReporter {
        let base_url = self.base_url.trim_end_matches('/');
        CiReporter {
            tests_url: format!("{base_url}{TESTS_PATH}"),
            names: NameRegistry::new(),
            context: OnceLock::new(),
            dispatcher: ApiDispatcher::new(transport),
            forward_to: self.forward_to,
        }
    }
}

/// State captured when the assembly under test starts.
#[derive(Clone, Debug)]
struct TestRunContext {
    assembly_file_name: String,
}

/// Reports each test event to the reporting API as a create or update request.
///
/// One reporter is used per assembly run. It may be shared between threads: all event handling
/// takes `&self`.
///
/// * A starting test is created with outcome `Running`, under the name it will finish with.
/// * A finished test updates the record, claiming a unique name: a test whose display name has
///   already finished `n` times in this run is reported as `"{name} {n}"`.
///
/// Requests are sent in the background and their results never affect event handling. Call
/// [`finish`](Self::finish) at the end of the run to wait for outstanding requests.
pub struct CiReporter {
    tests_url: String,
    names: NameRegistry,
    context: OnceLock<TestRunContext>,
    dispatcher: ApiDispatcher,
    forward_to: Option<Box<dyn TestEventHandler>>,
}

impl CiReporter {
    /// Reports an event, then forwards it to the configured handler, if any.
    ///
    /// Only the forwarding handler can return an error. Reporting itself never fails.
    pub fn report_event(&self, event: &TestEvent) -> Result<(), WriteEventError> {
        match event {
            TestEvent::AssemblyStarting { assembly_path } => {
                self.assembly_starting(assembly_path);
            }
            TestEvent::TestStarting { display_name } => {
                let test_name = self.names.peek_display_name(display_name);
                self.send(
                    ApiMethod::Create,
                    OutcomeReport::running(test_name, self.file_name()),
                );
            }
            TestEvent::TestPassed {
                display_name,
                execution_time,
                output,
            } => {
                let report =
                    self.finished_report(display_name, TestOutcome::Passed, *execution_time);
                self.send(ApiMethod::Update, report.with_output(output.as_deref()));
            }
            TestEvent::TestSkipped {
                display_name,
                execution_time,
                reason: _,
            } => {
                let report =
                    self.finished_report(display_name, TestOutcome::Skipped, *execution_time);
                self.send(ApiMethod::Update, report);
            }
            TestEvent::TestFailed {
                display_name,
                execution_time,
                output,
                failure,
            } => {
                let report = self
                    .finished_report(display_name, TestOutcome::Failed, *execution_time)
                    .with_error(failure.combined_message(), failure.combined_stack_trace())
                    .with_output(output.as_deref());
                self.send(ApiMethod::Update, report);
            }
        }

        match &self.forward_to {
            Some(handler) => handler.handle_event(event),
            None => Ok(()),
        }
    }

    /// Returns the URL that reports are sent to.
    pub fn tests_url(&self) -> &str {
        &self.tests_url
    }

    /// Returns the file name of the assembly under test, if an `AssemblyStarting` event has been
    /// seen.
    pub fn assembly_file_name(&self) -> Option<&str> {
        self.context
            .get()
            .map(|context| context.assembly_file_name.as_str())
    }

    /// Waits for all outstanding requests to be sent and returns delivery counts.
    pub fn finish(self) -> Result<DispatchStats, DispatcherError> {
        self.dispatcher.finish()
    }

    // ---
    // Helper methods
    // ---

    fn assembly_starting(&self, assembly_path: &Utf8Path) {
        let assembly_file_name = assembly_path
            .file_name()
            .unwrap_or(assembly_path.as_str())
            .to_owned();
        if let Err(ignored) = self.context.set(TestRunContext { assembly_file_name }) {
            warn!(
                "ignoring assembly `{}`: this reporter is already reporting `{}`",
                ignored.assembly_file_name,
                self.assembly_file_name().unwrap_or_default(),
            );
        }
    }

    fn file_name(&self) -> Option<String> {
        self.assembly_file_name().map(str::to_owned)
    }

    fn finished_report(
        &self,
        display_name: &str,
        outcome: TestOutcome,
        execution_time: Duration,
    ) -> OutcomeReport {
        let test_name = self.names.resolve_finished_name(display_name);
        OutcomeReport::finished(test_name, self.file_name(), outcome, execution_time)
    }

    fn send(&self, method: ApiMethod, body: OutcomeReport) {
        self.dispatcher.dispatch(ApiRequest {
            method,
            url: self.tests_url.clone(),
            body,
        });
    }
}

impl TestEventHandler for CiReporter {
    fn handle_event(&self, event: &TestEvent) -> Result<(), WriteEventError> {
        self.report_event(event)
    }
}
