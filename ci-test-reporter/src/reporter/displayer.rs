// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints test events as human-readable status lines.

use super::{TestEvent, TestEventHandler};
use crate::errors::WriteEventError;
use owo_colors::{OwoColorize, Style};
use std::{
    fmt,
    io::{self, Write},
    sync::{Mutex, PoisonError},
    time::Duration,
};

#[derive(Debug, Default, Clone)]
struct Styles {
    pass: Style,
    fail: Style,
    skip: Style,
    start: Style,
    test_name: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.start = Style::new().bold();
        self.test_name = Style::new().blue().bold();
    }
}

/// Writes one status line per test event to an output stream, typically standard error.
///
/// ```text
///      RUNNING tests-0123
///        START my_crate::tests::a
///         PASS [   0.500s] my_crate::tests::a
/// ```
#[derive(Debug)]
pub struct DisplayReporter<W> {
    styles: Styles,
    output: Mutex<W>,
}

impl DisplayReporter<io::Stderr> {
    /// Creates a display reporter writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> DisplayReporter<W> {
    /// Creates a display reporter writing to `output`.
    pub fn new(output: W) -> Self {
        Self {
            styles: Styles::default(),
            output: Mutex::new(output),
        }
    }

    /// Set to true if the reporter should colorize output.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.styles = Styles::default();
        if should_colorize {
            self.styles.colorize();
        }
        self
    }

    /// Returns the underlying output.
    pub fn into_inner(self) -> W {
        self.output
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_event(&self, event: &TestEvent) -> io::Result<()> {
        // Format the whole event first so that lines from concurrent events aren't interleaved.
        let mut buf = Vec::new();
        match event {
            TestEvent::AssemblyStarting { assembly_path } => {
                writeln!(buf, "{:>12} {}", "RUNNING".style(self.styles.start), assembly_path)?;
            }
            TestEvent::TestStarting { display_name } => {
                writeln!(
                    buf,
                    "{:>12} {}",
                    "START".style(self.styles.start),
                    display_name.style(self.styles.test_name),
                )?;
            }
            TestEvent::TestPassed {
                display_name,
                execution_time,
                ..
            } => {
                writeln!(
                    buf,
                    "{:>12} {}{}",
                    "PASS".style(self.styles.pass),
                    DisplayBracketedDuration(*execution_time),
                    display_name.style(self.styles.test_name),
                )?;
            }
            TestEvent::TestSkipped {
                display_name,
                reason,
                ..
            } => {
                write!(
                    buf,
                    "{:>12} {}",
                    "SKIP".style(self.styles.skip),
                    display_name.style(self.styles.test_name),
                )?;
                match reason {
                    Some(reason) => writeln!(buf, ": {reason}")?,
                    None => writeln!(buf)?,
                }
            }
            TestEvent::TestFailed {
                display_name,
                execution_time,
                failure,
                ..
            } => {
                writeln!(
                    buf,
                    "{:>12} {}{}",
                    "FAIL".style(self.styles.fail),
                    DisplayBracketedDuration(*execution_time),
                    display_name.style(self.styles.test_name),
                )?;
                if let Some(message) = failure.combined_message() {
                    for line in message.lines() {
                        writeln!(buf, "{:>12} {line}", "")?;
                    }
                }
            }
        }

        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output.write_all(&buf)?;
        output.flush()
    }
}

impl<W: Write + Send> TestEventHandler for DisplayReporter<W> {
    fn handle_event(&self, event: &TestEvent) -> Result<(), WriteEventError> {
        self.write_event(event).map_err(WriteEventError::Io)
    }
}

struct DisplayBracketedDuration(Duration);

impl fmt::Display for DisplayBracketedDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // * > means right-align.
        // * 8 is the number of characters to pad to.
        // * .3 means print three digits after the decimal point.
        write!(f, "[{:>8.3?}s] ", self.0.as_secs_f64())
    }
}
