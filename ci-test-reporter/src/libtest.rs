// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of libtest-compatible JSON output into [`TestEvent`]s.
//!
//! Test binaries run with `-Z unstable-options --format json --report-time`, and
//! `cargo nextest run --message-format libtest-json`, print one JSON object per line:
//!
//! * `{ "type": "suite", "event": "started", "test_count": <u32> }`
//! * `{ "type": "test", "event": "started", "name": "<name>" }`
//! * `{ "type": "test", "name": "<name>", "event": "ok", "exec_time": <f64>, "stdout": "<output>" }`
//! * `{ "type": "test", "name": "<name>", "event": "ignored", "message": "<reason>" }`
//! * `{ "type": "test", "name": "<name>", "event": "failed", "exec_time": <f64>, "stdout": "<output>" }`
//!   * with an additional `"message"` field for some failures, such as a `#[should_panic]`
//!     message mismatch or an exceeded time limit
//! * `{ "type": "suite", "event": "ok" | "failed", "passed": <u32>, ... }`
//!
//! Only test events produce [`TestEvent`]s. The assembly under test is not part of the format,
//! so callers report [`TestEvent::AssemblyStarting`] themselves.

use crate::{
    errors::{LibtestParseError, LibtestParseErrorKind},
    reporter::{FailureCause, FailureDescription, TestEvent},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const KIND_TEST: &str = "test";

const EVENT_STARTED: &str = "started";
const EVENT_IGNORED: &str = "ignored";
const EVENT_OK: &str = "ok";
const EVENT_FAILED: &str = "failed";

/// The cause reported when a failed test carries no panic or message.
const UNKNOWN_FAILURE: &str = "test failed";

#[derive(Debug, Deserialize)]
struct LibtestLine {
    #[serde(rename = "type")]
    kind: String,
    event: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    exec_time: Option<f64>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses libtest JSON output one line at a time.
#[derive(Debug, Default)]
pub struct LibtestEventParser {
    line_number: usize,
}

impl LibtestEventParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the next line of input.
    ///
    /// Returns `Ok(None)` for blank lines and for lines that don't correspond to a test lifecycle
    /// event, such as suite events.
    pub fn parse_line(&mut self, line: &str) -> Result<Option<TestEvent>, LibtestParseError> {
        self.line_number += 1;
        let line_number = self.line_number;

        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        parse_event(line).map_err(|err| LibtestParseError { line_number, err })
    }
}

fn parse_event(line: &str) -> Result<Option<TestEvent>, LibtestParseErrorKind> {
    let line: LibtestLine = serde_json::from_str(line).map_err(LibtestParseErrorKind::Json)?;
    if line.kind != KIND_TEST {
        debug!("skipping libtest `{}` event `{}`", line.kind, line.event);
        return Ok(None);
    }

    let event = line.event.as_str();
    if !matches!(
        event,
        EVENT_STARTED | EVENT_OK | EVENT_IGNORED | EVENT_FAILED
    ) {
        debug!("skipping libtest test event `{event}`");
        return Ok(None);
    }

    let display_name = line
        .name
        .ok_or_else(|| LibtestParseErrorKind::MissingName {
            event: line.event.clone(),
        })?;
    let execution_time = parse_exec_time(line.exec_time)?;

    let event = match event {
        EVENT_STARTED => TestEvent::TestStarting { display_name },
        EVENT_OK => TestEvent::TestPassed {
            display_name,
            execution_time,
            output: line.stdout,
        },
        EVENT_IGNORED => TestEvent::TestSkipped {
            display_name,
            execution_time,
            reason: line.message,
        },
        _ => {
            let failure = failure_from_output(line.stdout.as_deref(), line.message.as_deref());
            TestEvent::TestFailed {
                display_name,
                execution_time,
                output: line.stdout,
                failure,
            }
        }
    };
    Ok(Some(event))
}

/// Converts libtest's `exec_time` seconds to a duration whose whole milliseconds are
/// `exec_time * 1000` truncated toward zero.
fn parse_exec_time(exec_time: Option<f64>) -> Result<Duration, LibtestParseErrorKind> {
    let Some(exec_time) = exec_time else {
        return Ok(Duration::ZERO);
    };
    // Rejects negative, non-finite and overflowing values.
    Duration::try_from_secs_f64(exec_time)
        .map_err(|_| LibtestParseErrorKind::InvalidExecTime { exec_time })?;

    // Rounding to whole nanoseconds first can carry into the next millisecond.
    let millis = exec_time * 1000.0;
    let sub_millis_nanos = ((millis.fract() * 1_000_000.0) as u64).min(999_999);
    Ok(Duration::from_millis(millis.trunc() as u64) + Duration::from_nanos(sub_millis_nanos))
}

/// Builds the failure chain for a failed test: every panic in the captured output, followed by
/// the libtest message, if any.
fn failure_from_output(stdout: Option<&str>, message: Option<&str>) -> FailureDescription {
    let mut causes = stdout.map(extract_panics).unwrap_or_default();
    if let Some(message) = message {
        causes.push(FailureCause::new(message));
    }
    if causes.is_empty() {
        causes.push(FailureCause::new(UNKNOWN_FAILURE));
    }
    FailureDescription::new(causes)
}

/// Finds panics in captured test output.
///
/// A panic looks like:
///
/// ```text
/// thread 'tests::a' panicked at src/lib.rs:10:9:
/// assertion `left == right` failed
///   left: 1
///  right: 2
/// stack backtrace:
///    0: rust_begin_unwind
///    ...
/// note: run with `RUST_BACKTRACE=1` environment variable to display a backtrace
/// ```
///
/// The message runs until a blank line, a `note:` line, a backtrace or the next panic. The
/// location, plus the backtrace if one was captured, form the stack trace.
fn extract_panics(output: &str) -> Vec<FailureCause> {
    let mut causes = Vec::new();
    let mut lines = output.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(location) = panic_location(line) else {
            continue;
        };

        let mut message = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty()
                || next.starts_with("note:")
                || next.starts_with("stack backtrace:")
                || panic_location(next).is_some()
            {
                break;
            }
            message.push(*next);
            lines.next();
        }

        let mut stack_trace = location.to_owned();
        if lines
            .peek()
            .is_some_and(|next| next.starts_with("stack backtrace:"))
        {
            lines.next();
            while let Some(next) = lines.peek() {
                if !next.starts_with(' ') {
                    break;
                }
                stack_trace.push('\n');
                stack_trace.push_str(next);
                lines.next();
            }
        }

        let message = if message.is_empty() {
            "explicit panic".to_owned()
        } else {
            message.join("\n")
        };
        causes.push(FailureCause::new(message).with_stack_trace(stack_trace));
    }

    causes
}

/// Returns the location from a `thread '...' panicked at <location>:` line.
fn panic_location(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("thread '")?;
    let (_, location) = rest.split_once("' panicked at ")?;
    let location = location.trim_end();
    Some(location.strip_suffix(':').unwrap_or(location))
}
