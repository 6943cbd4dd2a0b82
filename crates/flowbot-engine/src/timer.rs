// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user focus and break timers.
//!
//! Every running timer lives in a registry keyed by `(user, kind)` and carries
//! a generation number. A completion only fires if it can remove its own
//! generation from the registry, and a cancel only succeeds if it removes the
//! entry first, so the two can never both take effect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flowbot_config::model::TimerConfig;
use flowbot_core::{ChannelAdapter, Clock, OutboundMessage, Recipient, TimerKind, UserId};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::messages;
use crate::streak::StreakEngine;

/// Completion length at which a focus session earns the extra acknowledgement.
const DEEP_WORK_MINUTES: u32 = 20;

/// Why a timer could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerStartError {
    #[error("You already have an active {0} timer.")]
    AlreadyRunning(TimerKind),
    #[error("{} timer cannot exceed {max} minutes or be less than {min} minute.", capitalized(.kind))]
    OutOfRange { kind: TimerKind, min: u32, max: u32 },
}

/// Why a timer could not be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerCancelError {
    #[error("You don't have an active {0} timer")]
    NotRunning(TimerKind),
}

/// "Focus" / "Break" for sentence starts.
pub fn capitalized(kind: &TimerKind) -> &'static str {
    match kind {
        TimerKind::Focus => "Focus",
        TimerKind::Break => "Break",
    }
}

struct ActiveTimer {
    generation: u64,
    minutes: u32,
    handle: JoinHandle<()>,
}

/// Registry of running timers plus everything a completion needs.
#[derive(Clone)]
pub struct TimerManager {
    inner: Arc<TimerInner>,
}

struct TimerInner {
    active: DashMap<(UserId, TimerKind), ActiveTimer>,
    next_generation: AtomicU64,
    streaks: Arc<StreakEngine>,
    channel: Arc<dyn ChannelAdapter>,
    clock: Arc<dyn Clock>,
    config: TimerConfig,
}

impl TimerManager {
    pub fn new(
        config: TimerConfig,
        streaks: Arc<StreakEngine>,
        channel: Arc<dyn ChannelAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                active: DashMap::new(),
                next_generation: AtomicU64::new(1),
                streaks,
                channel,
                clock,
                config,
            }),
        }
    }

    /// Start a `kind` timer of `minutes` for `user`.
    ///
    /// Completion notices go to `notify`. Must be called inside a Tokio runtime.
    pub fn start(
        &self,
        user: UserId,
        kind: TimerKind,
        minutes: i64,
        notify: Recipient,
    ) -> Result<(), TimerStartError> {
        let min_minutes = self.inner.config.min_minutes;
        let max_minutes = self.inner.config.max_minutes;
        let minutes = u32::try_from(minutes)
            .ok()
            .filter(|m| (min_minutes..=max_minutes).contains(m))
            .ok_or(TimerStartError::OutOfRange {
                kind,
                min: min_minutes,
                max: max_minutes,
            })?;

        match self.inner.active.entry((user, kind)) {
            Entry::Occupied(_) => Err(TimerStartError::AlreadyRunning(kind)),
            Entry::Vacant(slot) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let inner = self.inner.clone();
                // Deadline is fixed now, not when the task is first polled.
                let deadline = tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60));
                let handle = tokio::spawn(async move {
                    deadline.await;
                    inner.complete(user, kind, generation, minutes, notify).await;
                });
                slot.insert(ActiveTimer {
                    generation,
                    minutes,
                    handle,
                });
                debug!(user_id = %user, %kind, minutes, generation, "timer started");
                Ok(())
            }
        }
    }

    /// Cancel the user's running `kind` timer.
    pub fn cancel(&self, user: UserId, kind: TimerKind) -> Result<(), TimerCancelError> {
        match self.inner.active.remove(&(user, kind)) {
            Some((_, timer)) => {
                timer.handle.abort();
                debug!(user_id = %user, %kind, minutes = timer.minutes, "timer cancelled");
                Ok(())
            }
            None => Err(TimerCancelError::NotRunning(kind)),
        }
    }

    /// Abort every running timer. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let keys: Vec<_> = self.inner.active.iter().map(|e| *e.key()).collect();
        let cancelled = keys
            .into_iter()
            .filter_map(|key| self.inner.active.remove(&key))
            .map(|(_, timer)| timer.handle.abort())
            .count();
        if cancelled > 0 {
            info!(count = cancelled, "cancelled outstanding timers");
        }
        cancelled
    }

    pub fn is_running(&self, user: UserId, kind: TimerKind) -> bool {
        self.inner.active.contains_key(&(user, kind))
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.len()
    }
}

impl TimerInner {
    async fn complete(
        &self,
        user: UserId,
        kind: TimerKind,
        generation: u64,
        minutes: u32,
        notify: Recipient,
    ) {
        // Losing this race means the timer was cancelled or replaced.
        if self
            .active
            .remove_if(&(user, kind), |_, t| t.generation == generation)
            .is_none()
        {
            return;
        }

        let mut notices = vec![completion_text(kind, minutes)];
        if kind == TimerKind::Focus && minutes >= self.config.qualifying_minutes {
            let today = self.clock.now().date();
            self.streaks.on_qualifying_completion(user, today);
            notices.push(messages::STREAK_UPDATED.to_string());
        }
        info!(user_id = %user, %kind, minutes, "timer completed");

        for content in notices {
            let message = OutboundMessage {
                recipient: notify,
                content,
            };
            if let Err(e) = self.channel.send(message).await {
                warn!(user_id = %user, %kind, error = %e, "failed to deliver timer notice");
            }
        }
    }
}

/// Acknowledgement text for a naturally completed timer.
pub fn completion_text(kind: TimerKind, minutes: u32) -> String {
    match kind {
        TimerKind::Break => "Break ended.".to_string(),
        TimerKind::Focus if minutes == 1 => "Focus session complete (1 minute)".to_string(),
        TimerKind::Focus if minutes >= DEEP_WORK_MINUTES => format!(
            "Focus session complete ({minutes} minutes). That was a solid deep-work block, take a well-earned break."
        ),
        TimerKind::Focus => format!("Focus session complete ({minutes} minutes)"),
    }
}
