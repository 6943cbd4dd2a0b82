// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A clock tests can set and advance by hand.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use flowbot_core::Clock;

use crate::lock;

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// A clock reading `hour:00` local time on the given date.
    ///
    /// # Panics
    ///
    /// Panics if the date or hour is invalid.
    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid test date");
        Self::new(now)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        *lock(&self.now) += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(TimeDelta::days(days));
    }

    /// Move to `hour:00` on the current date.
    pub fn set_hour(&self, hour: u32) {
        let mut now = lock(&self.now);
        if let Some(at) = now.date().and_hms_opt(hour, 0, 0) {
            *now = at;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *lock(&self.now)
    }
}
