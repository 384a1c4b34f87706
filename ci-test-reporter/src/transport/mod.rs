// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of outcome reports to the reporting API.
//!
//! An [`ApiTransport`] performs a single request. The [`ApiDispatcher`] owns a transport on a
//! background thread, so that slow or failing requests never hold up event processing.

mod dispatcher;
mod http;

pub use dispatcher::*;
pub use http::*;

use crate::{errors::TransportError, reporter::OutcomeReport};
use std::fmt;

/// The path, relative to the API base URL, that tests are reported to.
pub const TESTS_PATH: &str = "/api/tests";

/// The kind of call made to the reporting API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    /// Adds a new test record. Sent as `POST`.
    Create,
    /// Updates an existing test record. Sent as `PUT`.
    Update,
}

impl ApiMethod {
    /// Returns the HTTP method used for this call.
    pub fn http_method(self) -> &'static str {
        match self {
            ApiMethod::Create => "POST",
            ApiMethod::Update => "PUT",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.http_method())
    }
}

/// A capability that sends one report to the reporting API.
///
/// Implementations must be reentrant: a transport is shared by reference and may be called from
/// any thread.
pub trait ApiTransport: Send + Sync + 'static {
    /// Sends `body` to `url` with the given method.
    fn send(&self, method: ApiMethod, url: &str, body: &OutcomeReport)
    -> Result<(), TransportError>;
}

impl<T: ApiTransport + ?Sized> ApiTransport for Box<T> {
    fn send(
        &self,
        method: ApiMethod,
        url: &str,
        body: &OutcomeReport,
    ) -> Result<(), TransportError> {
        (**self).send(method, url, body)
    }
}

impl<T: ApiTransport + ?Sized> ApiTransport for std::sync::Arc<T> {
    fn send(
        &self,
        method: ApiMethod,
        url: &str,
        body: &OutcomeReport,
    ) -> Result<(), TransportError> {
        (**self).send(method, url, body)
    }
}

/// A transport that logs every request instead of sending it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunTransport;

impl ApiTransport for DryRunTransport {
    fn send(
        &self,
        method: ApiMethod,
        url: &str,
        body: &OutcomeReport,
    ) -> Result<(), TransportError> {
        let json = serde_json::to_string(body).map_err(|err| TransportError::Serialize {
            method,
            url: url.to_owned(),
            err,
        })?;
        tracing::info!("[dry run] {method} {url} {json}");
        Ok(())
    }
}
