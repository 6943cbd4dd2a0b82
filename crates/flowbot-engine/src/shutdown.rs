// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the serve loop monitors, then runs the
//! ordered shutdown sequence.

use std::time::Duration;

use flowbot_core::PluginAdapter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::persistence::PersistenceService;
use crate::timer::TimerManager;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// What the shutdown sequence managed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub timers_cancelled: usize,
    pub flushed: bool,
}

/// Cancel timers, flush state within `flush_timeout`, close storage, then
/// close the command surface.
///
/// Every step is best-effort: failures are logged and the sequence continues.
pub async fn graceful_shutdown(
    timers: &TimerManager,
    persistence: &PersistenceService,
    surface: &dyn PluginAdapter,
    flush_timeout: Duration,
) -> ShutdownReport {
    let timers_cancelled = timers.cancel_all();

    let flushed = match tokio::time::timeout(flush_timeout, persistence.flush_all()).await {
        Ok(Ok(records)) => {
            info!(records, "final flush complete");
            true
        }
        Ok(Err(e)) => {
            warn!(error = %e, "final flush failed");
            false
        }
        Err(_) => {
            warn!(timeout_secs = flush_timeout.as_secs(), "final flush timed out");
            false
        }
    };

    if let Err(e) = persistence.storage().close().await {
        warn!(error = %e, "failed to close storage");
    }
    if let Err(e) = surface.shutdown().await {
        warn!(adapter = surface.name(), error = %e, "failed to close command surface");
    }

    ShutdownReport {
        timers_cancelled,
        flushed,
    }
}
