// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowbot serve` command implementation.
//!
//! Opens SQLite storage, restores state, starts the flush loop, connects to
//! Discord, starts the sweep loop, and runs until a shutdown signal arrives
//! or the gateway stops.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use flowbot_config::FlowbotConfig;
use flowbot_core::{FlowbotError, HealthStatus, PluginAdapter, StorageAdapter, SystemClock};
use flowbot_discord::DiscordChannel;
use flowbot_engine::{background, shutdown, Engine};
use flowbot_ollama::OllamaCliProvider;
use flowbot_storage::SqliteStorage;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long to wait for the gateway task after its shards were stopped.
const GATEWAY_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the `flowbot serve` command.
pub async fn run_serve(config: FlowbotConfig) -> Result<(), FlowbotError> {
    init_tracing(&config.bot.log_level);

    info!(bot = %config.bot.name, "starting flowbot serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.inspect_err(|e| {
        error!(path = ?config.storage.database_path, error = %e, "failed to open storage");
    })?;

    let provider = Arc::new(OllamaCliProvider::from_config(&config.chat));
    match provider.health_check().await {
        Ok(HealthStatus::Healthy) => {
            info!(command = %provider.command_line(), "chat command available");
        }
        Ok(HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => {
            warn!(command = %provider.command_line(), reason = %reason, "chat command unavailable, /chat will reply with a failure notice");
        }
        Err(e) => warn!(error = %e, "chat command health check failed"),
    }

    let discord = Arc::new(DiscordChannel::new(
        config.discord.clone(),
        config.timer.clone(),
    ));

    let engine = Engine::new(
        &config,
        discord.clone(),
        provider,
        storage,
        Arc::new(SystemClock),
    );

    let restored = engine.persistence.hydrate().await?;
    info!(records = restored, "state restored from storage");

    let cancel = shutdown::install_signal_handler();

    let flush_loop = background::spawn_flush_loop(
        engine.persistence.clone(),
        Duration::from_secs(config.persistence.flush_interval_secs),
        cancel.clone(),
    );

    let started = start_gateway_then_sweep(
        discord.clone().start(engine.router.clone()),
        &engine,
        Duration::from_secs(config.streak.sweep_interval_secs),
        &cancel,
    )
    .await;
    let (mut gateway, sweep_loop) = match started {
        Ok((gateway, sweep_loop)) => (Some(gateway), Some(sweep_loop)),
        Err(e) => {
            error!(error = %e, "failed to start discord client");
            cancel.cancel();
            (None, None)
        }
    };

    let mut gateway_exited = false;
    if let Some(handle) = gateway.as_mut() {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = handle => {
                warn!("discord gateway exited, shutting down");
                gateway_exited = true;
                cancel.cancel();
            }
        }
    }

    let _ = flush_loop.await;
    if let Some(sweep_loop) = sweep_loop {
        let _ = sweep_loop.await;
    }

    let report = shutdown::graceful_shutdown(
        &engine.timers,
        &engine.persistence,
        discord.as_ref(),
        Duration::from_secs(config.persistence.shutdown_timeout_secs),
    )
    .await;

    if let Some(handle) = gateway.filter(|_| !gateway_exited) {
        if tokio::time::timeout(GATEWAY_STOP_TIMEOUT, handle).await.is_err() {
            warn!("discord gateway did not stop in time");
        }
    }

    info!(
        timers_cancelled = report.timers_cancelled,
        flushed = report.flushed,
        "flowbot serve shutdown complete"
    );
    Ok(())
}

/// Awaits the gateway start, then spawns the sweep loop.
///
/// The sweep's first pass fires immediately and delivers DMs, so it must not
/// run before the surface can send. A failed start spawns nothing.
async fn start_gateway_then_sweep<F>(
    start: F,
    engine: &Engine,
    period: Duration,
    cancel: &CancellationToken,
) -> Result<(JoinHandle<()>, JoinHandle<()>), FlowbotError>
where
    F: Future<Output = Result<JoinHandle<()>, FlowbotError>>,
{
    let gateway = start.await?;
    let sweep_loop = background::spawn_sweep_loop(
        engine.streaks.clone(),
        engine.clock.clone(),
        period,
        cancel.clone(),
    );
    Ok((gateway, sweep_loop))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flowbot_core::{StreakRecord, UserId};
    use flowbot_test_utils::TestHarness;

    const HOUR: Duration = Duration::from_secs(3600);

    fn seed_lapsed_streak(harness: &TestHarness) {
        harness.engine().repos.streaks.upsert(
            UserId(7),
            StreakRecord {
                day: 20,
                month: 2,
                year: 2026,
                value: 4,
                reminded: 20,
            },
        );
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_waits_for_the_gateway_to_start() {
        let harness = TestHarness::new().await.unwrap();
        seed_lapsed_streak(&harness);
        let cancel = CancellationToken::new();
        let sent_during_start = AtomicUsize::new(usize::MAX);

        let start = async {
            settle().await;
            sent_during_start.store(harness.channel().sent_messages().len(), Ordering::SeqCst);
            Ok::<_, FlowbotError>(tokio::spawn(async {}))
        };
        let (gateway, sweep_loop) =
            start_gateway_then_sweep(start, harness.engine(), HOUR, &cancel)
                .await
                .unwrap();

        assert_eq!(sent_during_start.load(Ordering::SeqCst), 0);
        assert!(harness.engine().repos.streaks.get(UserId(7)).is_some());

        settle().await;
        assert_eq!(harness.channel().contents_for(UserId(7)).len(), 1);
        assert!(harness.engine().repos.streaks.get(UserId(7)).is_none());

        cancel.cancel();
        sweep_loop.await.unwrap();
        gateway.await.unwrap();
    }

    #[tokio::test]
    async fn failed_gateway_start_spawns_no_sweep() {
        let harness = TestHarness::new().await.unwrap();
        seed_lapsed_streak(&harness);
        let cancel = CancellationToken::new();

        let start = async { Err::<JoinHandle<()>, _>(FlowbotError::channel("no token")) };
        let result = start_gateway_then_sweep(start, harness.engine(), HOUR, &cancel).await;
        assert!(result.is_err());

        settle().await;
        assert!(harness.channel().sent_messages().is_empty());
        assert!(harness.engine().repos.streaks.get(UserId(7)).is_some());
    }
}
