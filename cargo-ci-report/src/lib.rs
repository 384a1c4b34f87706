// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reports the results of a Rust test run to a CI test-reporting service.
//!
//! Pipe libtest-compatible JSON into `cargo ci-report`:
//!
//! ```text
//! cargo nextest run --message-format libtest-json | cargo ci-report --assembly my-tests
//! ```
//!
//! The API base URL is read from `APPVEYOR_API_URL`, a config file, or `--api-url`.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
