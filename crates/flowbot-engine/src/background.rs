// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background loops: periodic persistence flush and the streak sweep.
//!
//! Both loops stop when their [`CancellationToken`] is cancelled. A failed
//! pass is logged and the loop waits for the next tick.

use std::sync::Arc;
use std::time::Duration;

use flowbot_core::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::persistence::PersistenceService;
use crate::streak::StreakEngine;

/// Flush all state every `period`. The first flush happens one period after start.
pub fn spawn_flush_loop(
    persistence: Arc<PersistenceService>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick.
        interval.tick().await;
        info!(interval_secs = period.as_secs(), "persistence flush loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = persistence.flush_all().await {
                        warn!(error = %e, "periodic flush failed, retrying next interval");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("persistence flush loop shutting down");
                    break;
                }
            }
        }
    })
}

/// Run the streak sweep immediately and then every `period`.
pub fn spawn_sweep_loop(
    streaks: Arc<StreakEngine>,
    clock: Arc<dyn Clock>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "streak sweep loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    streaks.check_all(clock.now()).await;
                }
                _ = cancel.cancelled() => {
                    info!("streak sweep loop shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flowbot_core::{StreakRecord, UserId};
    use flowbot_test_utils::{ManualClock, MemoryStorage, MockChannel};

    use crate::repository::{Repositories, StreakRepository};

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flush_loop_saves_every_period_until_cancelled() {
        let storage = Arc::new(MemoryStorage::new());
        let repos = Repositories::new();
        repos.messages.increment(UserId(1));
        let persistence = Arc::new(PersistenceService::new(storage.clone(), repos));
        let cancel = CancellationToken::new();

        let handle = spawn_flush_loop(persistence, Duration::from_secs(60), cancel.clone());
        settle().await;
        assert_eq!(storage.save_count(), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(storage.save_count(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(storage.save_count(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn flush_failures_do_not_stop_the_loop() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail(true);
        let persistence = Arc::new(PersistenceService::new(storage.clone(), Repositories::new()));
        let cancel = CancellationToken::new();
        let handle = spawn_flush_loop(persistence, Duration::from_secs(60), cancel.clone());

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        storage.set_fail(false);
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(storage.save_count(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_loop_runs_immediately() {
        let repo = Arc::new(StreakRepository::new());
        repo.upsert(
            UserId(3),
            StreakRecord::started_on(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
        );
        let channel = Arc::new(MockChannel::new());
        let engine = Arc::new(StreakEngine::new(repo.clone(), channel.clone(), 17));
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8));
        let cancel = CancellationToken::new();

        let handle = spawn_sweep_loop(engine, clock, Duration::from_secs(3600), cancel.clone());
        settle().await;
        assert!(repo.is_empty());
        assert_eq!(channel.sent_messages().len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
