// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Hatch integration tests.
//!
//! - [`ScriptedTransport`] - delivery transport that replays canned responses
//! - [`TestHarness`] - intake service over a temp database and scripted providers

pub mod harness;
pub mod scripted_transport;

pub use harness::{email, sms, TestHarness, TestHarnessBuilder};
pub use scripted_transport::{ScriptedTransport, Step};
