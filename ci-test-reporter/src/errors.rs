// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the CI test reporter.

use crate::transport::ApiMethod;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::fmt;
use thiserror::Error;

/// An error that occurred while loading the reporter configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    err: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, err: ConfigParseErrorKind) -> Self {
        Self { config_file, err }
    }

    /// Returns the user config file that was being read, if any.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.err
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config_file {
            Some(config_file) => {
                write!(f, "failed to parse reporter config at `{config_file}`")
            }
            None => write!(f, "failed to parse reporter config"),
        }
    }
}

/// The kind of error that occurred while loading the reporter configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the layered config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<ConfigError>),
}

/// An error that occurred while sending a request to the reporting API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request body could not be serialized.
    #[error("failed to serialize request body for {method} {url}")]
    Serialize {
        /// The API method.
        method: ApiMethod,

        /// The URL the request was for.
        url: String,

        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },

    /// The request could not be sent, or no response was received.
    #[error("{method} {url} failed")]
    Request {
        /// The API method.
        method: ApiMethod,

        /// The URL the request was for.
        url: String,

        /// The underlying error.
        #[source]
        err: Box<ureq::Error>,
    },

    /// The API responded with a non-success status code.
    #[error("{method} {url} returned status {status}")]
    Status {
        /// The API method.
        method: ApiMethod,

        /// The URL the request was for.
        url: String,

        /// The HTTP status code.
        status: u16,
    },
}

/// An error that occurred while shutting down an [`ApiDispatcher`](crate::transport::ApiDispatcher).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatcherError {
    /// The dispatcher's worker thread panicked.
    #[error("dispatcher worker panicked: {message}")]
    WorkerPanic {
        /// The panic message, if it could be extracted.
        message: String,
    },
}

/// An error that occurred while writing a test event to a display reporter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),
}

/// An error that occurred while parsing a line of libtest JSON output.
#[derive(Debug, Error)]
#[error("failed to parse libtest event on line {line_number}")]
#[non_exhaustive]
pub struct LibtestParseError {
    /// The 1-based line number within the input.
    pub line_number: usize,

    /// The underlying error.
    #[source]
    pub err: LibtestParseErrorKind,
}

/// The kind of error that occurred while parsing libtest JSON output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibtestParseErrorKind {
    /// The line was not a valid libtest JSON object.
    #[error("invalid JSON")]
    Json(#[source] serde_json::Error),

    /// A test event did not have a name.
    #[error("`{event}` test event is missing `name`")]
    MissingName {
        /// The libtest event kind.
        event: String,
    },

    /// The `exec_time` field was negative or not finite.
    #[error("invalid exec_time {exec_time}")]
    InvalidExecTime {
        /// The value that was parsed.
        exec_time: f64,
    },
}

/// Displays an error along with its chain of sources.
///
/// Used when an error is logged rather than returned.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: std::error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: std::error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(err) = source {
            write!(f, "\n  - {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
