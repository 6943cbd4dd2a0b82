// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock abstraction.
//!
//! Streaks are defined by local calendar days, so engines read "now" through
//! a [`Clock`] instead of calling `chrono::Local` directly.

use chrono::NaiveDateTime;

/// Source of the current local date and time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// The process-local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
