// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget delivery of reports on a background thread.

use super::{ApiMethod, ApiTransport};
use crate::{
    errors::{DispatcherError, DisplayErrorChain},
    reporter::OutcomeReport,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::mpsc,
    thread::JoinHandle,
};
use tracing::warn;

/// A single request queued for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    /// The kind of call.
    pub method: ApiMethod,

    /// The full URL to send the request to.
    pub url: String,

    /// The report to send.
    pub body: OutcomeReport,
}

/// Counts of requests handled by an [`ApiDispatcher`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Requests that the transport delivered successfully.
    pub sent: usize,

    /// Requests that failed. Failures are logged and otherwise ignored.
    pub failed: usize,
}

/// Sends requests through an [`ApiTransport`] on a separate thread.
///
/// Requests are queued on an unbounded channel, so [`dispatch`](Self::dispatch) never waits for
/// the transport. The worker sends requests one at a time, in the order they were queued.
#[derive(Debug)]
pub struct ApiDispatcher {
    // Invariant: sender is always Some until finish() is called.
    sender: Option<mpsc::Sender<ApiRequest>>,
    handle: JoinHandle<DispatchStats>,
}

impl ApiDispatcher {
    /// Creates a new dispatcher, spawning a worker thread that owns `transport`.
    pub fn new<T: ApiTransport>(transport: T) -> Self {
        let (sender, receiver) = mpsc::channel::<ApiRequest>();
        let handle = std::thread::spawn(move || {
            let mut stats = DispatchStats::default();
            while let Ok(request) = receiver.recv() {
                // A panicking transport fails only the request it panicked on.
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    transport.send(request.method, &request.url, &request.body)
                }));
                match result {
                    Ok(Ok(())) => stats.sent += 1,
                    Ok(Err(error)) => {
                        stats.failed += 1;
                        warn!(
                            "failed to report test `{}` ({}): {}",
                            request.body.test_name,
                            request.body.outcome,
                            DisplayErrorChain::new(&error),
                        );
                    }
                    Err(panic_payload) => {
                        stats.failed += 1;
                        warn!(
                            "transport panicked while reporting test `{}` ({}): {}",
                            request.body.test_name,
                            request.body.outcome,
                            panic_payload_to_string(panic_payload),
                        );
                    }
                }
            }

            // All senders have been dropped.
            stats
        });

        Self {
            sender: Some(sender),
            handle,
        }
    }

    /// Queues a request for delivery.
    pub fn dispatch(&self, request: ApiRequest) {
        if let Some(sender) = &self.sender {
            // Ignore send errors: they mean that the worker has exited, which is reported by
            // finish().
            _ = sender.send(request);
        }
    }

    /// Waits for every queued request to be handled, then stops the worker thread.
    pub fn finish(mut self) -> Result<DispatchStats, DispatcherError> {
        // Drop the sender, which signals the worker to exit once the queue is drained.
        std::mem::drop(self.sender.take());

        self.handle
            .join()
            .map_err(|panic_payload| DispatcherError::WorkerPanic {
                message: panic_payload_to_string(panic_payload),
            })
    }
}

/// Extracts a string message from a panic payload.
fn panic_payload_to_string(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(unknown panic payload)".to_owned()
    }
}
