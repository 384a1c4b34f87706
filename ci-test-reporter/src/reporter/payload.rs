// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The body of create and update requests sent to the reporting API.

use serde::Serialize;
use std::{fmt, time::Duration};

/// The test framework label sent with every report.
pub const TEST_FRAMEWORK: &str = "libtest";

/// The maximum number of characters of captured output sent with a report.
pub const MAX_OUTPUT_CHARS: usize = 4096;

/// The outcome of a test, as understood by the reporting API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TestOutcome {
    /// The test has started and not yet finished.
    Running,
    /// The test passed.
    Passed,
    /// The test was skipped.
    Skipped,
    /// The test failed.
    Failed,
}

impl TestOutcome {
    /// Returns the string the API uses for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Running => "Running",
            TestOutcome::Passed => "Passed",
            TestOutcome::Skipped => "Skipped",
            TestOutcome::Failed => "Failed",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single test report, serialized as the JSON body of a create or update request.
///
/// Absent fields are omitted from the JSON object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    /// The disambiguated test name.
    pub test_name: String,

    /// The file name of the assembly under test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Always [`TEST_FRAMEWORK`].
    pub test_framework: &'static str,

    /// The outcome of the test.
    pub outcome: TestOutcome,

    /// The time the test took, for finished tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_milliseconds: Option<u64>,

    /// The combined message of a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// The combined stack trace of a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_stack_trace: Option<String>,

    /// Captured output, at most [`MAX_OUTPUT_CHARS`] characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_out: Option<String>,

    /// Never populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_err: Option<String>,
}

impl OutcomeReport {
    /// Creates a report for a test that has started running.
    pub fn running(test_name: String, file_name: Option<String>) -> Self {
        Self {
            test_name,
            file_name,
            test_framework: TEST_FRAMEWORK,
            outcome: TestOutcome::Running,
            duration_milliseconds: None,
            error_message: None,
            error_stack_trace: None,
            std_out: None,
            std_err: None,
        }
    }

    /// Creates a report for a finished test with the given outcome and execution time.
    pub fn finished(
        test_name: String,
        file_name: Option<String>,
        outcome: TestOutcome,
        execution_time: Duration,
    ) -> Self {
        Self {
            duration_milliseconds: Some(duration_millis(execution_time)),
            outcome,
            ..Self::running(test_name, file_name)
        }
    }

    /// Attaches captured output, truncated to [`MAX_OUTPUT_CHARS`].
    pub fn with_output(mut self, output: Option<&str>) -> Self {
        self.std_out = output.map(|output| truncate_output(output).to_owned());
        self
    }

    /// Attaches a failure message and stack trace.
    pub fn with_error(mut self, message: Option<String>, stack_trace: Option<String>) -> Self {
        self.error_message = message;
        self.error_stack_trace = stack_trace;
        self
    }
}

/// Converts a duration to whole milliseconds, truncating toward zero.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns the first [`MAX_OUTPUT_CHARS`] characters of `output`.
///
/// Characters are Unicode scalar values, so multi-byte characters are never split.
pub fn truncate_output(output: &str) -> &str {
    match output.char_indices().nth(MAX_OUTPUT_CHARS) {
        Some((end, _)) => &output[..end],
        None => output,
    }
}
