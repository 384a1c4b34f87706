// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report test lifecycle events to a CI service and, optionally, to a terminal.
//!
//! The main type here is [`CiReporter`], which is constructed via a [`CiReporterBuilder`].

mod displayer;
mod events;
mod imp;
mod names;
mod payload;

pub use displayer::*;
pub use events::*;
pub use imp::*;
pub use names::NameRegistry;
pub use payload::*;
