// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for relaying test lifecycle events to a CI test-reporting service, such as
//! the AppVeyor build worker API.
//!
//! The main type is [`CiReporter`](reporter::CiReporter): it receives
//! [`TestEvent`](reporter::TestEvent)s, gives every reported test a unique name, and hands create
//! and update requests to an [`ApiDispatcher`](transport::ApiDispatcher), which sends them on a
//! background thread.

pub mod config;
pub mod errors;
pub mod libtest;
pub mod reporter;
pub mod transport;
