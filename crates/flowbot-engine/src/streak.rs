// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily focus streak rules and the expiry/reminder sweep.
//!
//! A streak counts consecutive calendar days with at least one qualifying
//! focus session. Day differences are always calendar-date differences in
//! local time, never elapsed hours.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use flowbot_core::{ChannelAdapter, OutboundMessage, StreakRecord, UserId};
use tracing::{debug, info, warn};

use crate::messages;
use crate::repository::StreakRepository;

/// What a qualifying completion did to the user's streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// First qualifying completion: a new streak of 1.
    Started,
    /// Already counted today; value unchanged.
    AlreadyCounted { value: u32 },
    /// Completed on the day after the last one.
    Extended { value: u32 },
    /// Gap of two or more days; back to 1.
    Restarted,
}

impl StreakUpdate {
    pub fn value(&self) -> u32 {
        match self {
            Self::Started | Self::Restarted => 1,
            Self::AlreadyCounted { value } | Self::Extended { value } => *value,
        }
    }
}

/// What the sweep should do with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Streak lapsed: notify and delete.
    Expire,
    /// Send today's reminder.
    Remind,
    /// Nothing to do.
    Skip,
}

/// Decide the sweep action for `record` at `now`.
pub fn evaluate(record: &StreakRecord, now: NaiveDateTime, reminder_hour: u32) -> SweepAction {
    match record.days_since(now.date()) {
        days if days >= 2 => SweepAction::Expire,
        days if days <= 0 => SweepAction::Skip,
        _ if now.hour() == reminder_hour && record.reminded != now.day() => SweepAction::Remind,
        _ => SweepAction::Skip,
    }
}

/// Apply a qualifying completion on `today` to an existing record.
pub fn apply_completion(record: &mut StreakRecord, today: NaiveDate) -> StreakUpdate {
    let update = match record.days_since(today) {
        0 => StreakUpdate::AlreadyCounted {
            value: record.value,
        },
        1 => {
            record.value = record.value.saturating_add(1);
            StreakUpdate::Extended {
                value: record.value,
            }
        }
        days if days >= 2 => {
            record.value = 1;
            StreakUpdate::Restarted
        }
        // Clock moved backwards; keep the value and re-anchor on today.
        _ => StreakUpdate::AlreadyCounted {
            value: record.value,
        },
    };
    record.touch(today);
    update
}

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub ended: usize,
    pub reminded: usize,
    pub failed: usize,
}

/// Owns the streak repository and the rules that mutate it.
pub struct StreakEngine {
    repo: Arc<StreakRepository>,
    channel: Arc<dyn ChannelAdapter>,
    reminder_hour: u32,
}

impl StreakEngine {
    pub fn new(
        repo: Arc<StreakRepository>,
        channel: Arc<dyn ChannelAdapter>,
        reminder_hour: u32,
    ) -> Self {
        Self {
            repo,
            channel,
            reminder_hour,
        }
    }

    /// Record a qualifying focus completion for `user` on `today`.
    pub fn on_qualifying_completion(&self, user: UserId, today: NaiveDate) -> StreakUpdate {
        let update = self.repo.upsert_with(
            user,
            || StreakRecord::started_on(today),
            |record, created| {
                if created {
                    StreakUpdate::Started
                } else {
                    apply_completion(record, today)
                }
            },
        );
        debug!(user_id = %user, ?update, "streak updated");
        update
    }

    /// The user's live streak value, `None` when absent or already lapsed.
    pub fn current(&self, user: UserId, today: NaiveDate) -> Option<u32> {
        self.repo
            .get(user)
            .filter(|record| record.days_since(today) < 2)
            .map(|record| record.value)
    }

    /// Walk every record once: expire lapsed streaks and send the daily
    /// reminder during the reminder hour.
    ///
    /// Delivery failures leave the record untouched so the next pass retries.
    pub async fn check_all(&self, now: NaiveDateTime) -> SweepReport {
        let mut report = SweepReport::default();
        let today = now.date();

        for (user, record) in self.repo.snapshot() {
            match evaluate(&record, now, self.reminder_hour) {
                SweepAction::Skip => {}
                SweepAction::Expire => {
                    let notice = OutboundMessage::direct(user, messages::STREAK_ENDED);
                    match self.channel.send(notice).await {
                        Ok(_) => {
                            self.repo.delete_if(user, |r| r.days_since(today) >= 2);
                            report.ended += 1;
                        }
                        Err(e) => {
                            warn!(user_id = %user, error = %e, "failed to deliver streak-ended notice");
                            report.failed += 1;
                        }
                    }
                }
                SweepAction::Remind => {
                    let reminder = OutboundMessage::direct(user, messages::random_reminder());
                    match self.channel.send(reminder).await {
                        Ok(_) => {
                            let day = now.day();
                            self.repo.update(user, |r| r.reminded = day);
                            report.reminded += 1;
                        }
                        Err(e) => {
                            warn!(user_id = %user, error = %e, "failed to deliver streak reminder");
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                ended = report.ended,
                reminded = report.reminded,
                failed = report.failed,
                "streak sweep complete"
            );
        }
        report
    }
}
