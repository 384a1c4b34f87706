// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::NO_HEADING_TARGET;
use ci_test_reporter::{config::ReporterConfig, errors::ConfigParseError};
use std::error::Error;
use thiserror::Error;
use tracing::error;

/// Process exit codes returned by `cargo ci-report`.
pub enum CiReportExitCode {}

impl CiReportExitCode {
    /// Configuration could not be loaded, or no API URL was configured.
    pub const SETUP_ERROR: i32 = 96;

    /// Reading test events from standard input failed.
    pub const READ_INPUT_ERROR: i32 = 97;
}

/// An error that was expected to occur, and which is reported to the user without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("no reporting API URL configured")]
    MissingApiUrl,
    #[error("failed to read test events from standard input")]
    ReadInputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::MissingApiUrl => CiReportExitCode::SETUP_ERROR,
            Self::ReadInputError { .. } => CiReportExitCode::READ_INPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!("{err}");
                err.source()
            }
            Self::MissingApiUrl => {
                error!(
                    "no reporting API URL configured: set {}, pass --api-url, \
                     or use --dry-run to log requests instead",
                    ReporterConfig::API_URL_ENV,
                );
                None
            }
            Self::ReadInputError { err } => {
                error!("failed to read test events from standard input");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
