// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ApiMethod, ApiTransport};
use crate::{errors::TransportError, reporter::OutcomeReport};
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// An [`ApiTransport`] that sends reports as JSON over HTTP.
#[derive(Debug)]
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /// Creates a new transport. Each request, including reading the response, is abandoned after
    /// `request_timeout`.
    pub fn new(request_timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(request_timeout))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl ApiTransport for HttpTransport {
    fn send(
        &self,
        method: ApiMethod,
        url: &str,
        body: &OutcomeReport,
    ) -> Result<(), TransportError> {
        let result = match method {
            ApiMethod::Create => self.agent.post(url).send_json(body),
            ApiMethod::Update => self.agent.put(url).send_json(body),
        };

        match result {
            Ok(response) => {
                debug!(
                    "{method} {url} ({}, {}): {}",
                    body.test_name,
                    body.outcome,
                    response.status(),
                );
                Ok(())
            }
            Err(ureq::Error::StatusCode(status)) => Err(TransportError::Status {
                method,
                url: url.to_owned(),
                status,
            }),
            Err(err) => Err(TransportError::Request {
                method,
                url: url.to_owned(),
                err: Box::new(err),
            }),
        }
    }
}
