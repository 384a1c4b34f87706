// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::WriteEventError;
use camino::Utf8PathBuf;
use std::time::Duration;

/// A test lifecycle event.
///
/// Events are produced by a test-execution engine, in arrival order per test, and consumed by a
/// [`TestEventHandler`] such as [`CiReporter`](super::CiReporter).
#[derive(Clone, Debug, PartialEq)]
pub enum TestEvent {
    /// The test assembly (binary) under test is starting.
    AssemblyStarting {
        /// The path to the assembly. Only the final path segment is reported.
        assembly_path: Utf8PathBuf,
    },

    /// A test started running.
    TestStarting {
        /// The display name of the test.
        display_name: String,
    },

    /// A test passed.
    TestPassed {
        /// The display name of the test.
        display_name: String,

        /// The time the test took to run.
        execution_time: Duration,

        /// Output captured while the test ran.
        output: Option<String>,
    },

    /// A test was skipped.
    TestSkipped {
        /// The display name of the test.
        display_name: String,

        /// The time spent on the test before it was skipped, usually zero.
        execution_time: Duration,

        /// Why the test was skipped, if known.
        reason: Option<String>,
    },

    /// A test failed.
    TestFailed {
        /// The display name of the test.
        display_name: String,

        /// The time the test took to run.
        execution_time: Duration,

        /// Output captured while the test ran.
        output: Option<String>,

        /// The chain of causes for the failure.
        failure: FailureDescription,
    },
}

impl TestEvent {
    /// Returns the raw display name of the test this event is for, or `None` for assembly
    /// events.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            TestEvent::AssemblyStarting { .. } => None,
            TestEvent::TestStarting { display_name }
            | TestEvent::TestPassed { display_name, .. }
            | TestEvent::TestSkipped { display_name, .. }
            | TestEvent::TestFailed { display_name, .. } => Some(display_name),
        }
    }
}

/// A single cause within a [`FailureDescription`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureCause {
    /// The message describing the cause.
    pub message: String,

    /// Where the cause was raised, if known.
    pub stack_trace: Option<String>,
}

impl FailureCause {
    /// Creates a new cause with a message and no stack trace.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: None,
        }
    }

    /// Attaches a stack trace to this cause.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }
}

/// The chain of causes for a failed test, in the order the engine reported them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureDescription {
    causes: Vec<FailureCause>,
}

impl FailureDescription {
    /// Separator placed between the messages of successive causes.
    pub const MESSAGE_SEPARATOR: &'static str = "\n---- ";

    /// Separator placed between the stack traces of successive causes.
    pub const STACK_TRACE_SEPARATOR: &'static str = "\n----- Inner Stack Trace -----\n";

    /// Creates a new failure description from a chain of causes.
    pub fn new(causes: impl IntoIterator<Item = FailureCause>) -> Self {
        Self {
            causes: causes.into_iter().collect(),
        }
    }

    /// Returns the causes in chain order.
    pub fn causes(&self) -> &[FailureCause] {
        &self.causes
    }

    /// Returns true if there are no causes.
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Joins the messages of every cause in chain order, or returns `None` if the chain is empty.
    pub fn combined_message(&self) -> Option<String> {
        if self.causes.is_empty() {
            return None;
        }
        let messages: Vec<&str> = self.causes.iter().map(|c| c.message.as_str()).collect();
        Some(messages.join(Self::MESSAGE_SEPARATOR))
    }

    /// Joins the stack traces of every cause in chain order, skipping causes without one.
    ///
    /// Returns `None` if no cause has a stack trace.
    pub fn combined_stack_trace(&self) -> Option<String> {
        let traces: Vec<&str> = self
            .causes
            .iter()
            .filter_map(|c| c.stack_trace.as_deref())
            .filter(|trace| !trace.is_empty())
            .collect();
        if traces.is_empty() {
            None
        } else {
            Some(traces.join(Self::STACK_TRACE_SEPARATOR))
        }
    }
}

/// A consumer of [`TestEvent`]s.
///
/// Handlers take `&self` because events may be delivered from several threads at once.
pub trait TestEventHandler: Send + Sync {
    /// Handles a single event.
    fn handle_event(&self, event: &TestEvent) -> Result<(), WriteEventError>;
}
