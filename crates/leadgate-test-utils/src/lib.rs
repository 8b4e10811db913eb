// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test utilities for Leadgate integration tests.
//!
//! Provides [`MockRuntime`], a scripted stand-in for the model runtime, and
//! [`TestHarness`], which wires a tempdir-backed SQLite store, the mock
//! runtime, and a tool registry together the way the server does.

pub mod harness;
pub mod mock_runtime;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_runtime::MockRuntime;
