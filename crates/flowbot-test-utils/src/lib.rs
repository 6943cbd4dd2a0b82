// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for FlowBot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Discord, Ollama, or a clock.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock language model with scripted responses
//! - [`MockChannel`] - Mock messaging channel that captures notifications
//! - [`MemoryStorage`] - In-memory storage adapter with failure injection
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Full engine over a temp SQLite database

pub mod clock;
pub mod harness;
pub mod mock_channel;
pub mod mock_provider;
pub mod mock_storage;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
pub use mock_provider::MockProvider;
pub use mock_storage::MemoryStorage;

use std::sync::{Mutex, MutexGuard};

/// Lock a std mutex, ignoring poisoning from a panicked test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
