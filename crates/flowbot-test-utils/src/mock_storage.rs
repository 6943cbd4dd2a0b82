// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter for tests that do not need SQLite.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use flowbot_core::{
    AdapterType, FlowbotError, HealthStatus, PluginAdapter, StateSnapshot, StorageAdapter,
};

use crate::lock;

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stored: Mutex<StateSnapshot>,
    saves: AtomicUsize,
    fail: AtomicBool,
    closed: AtomicBool,
    delay: Option<Duration>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with `snapshot`, as if from a previous run.
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            stored: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Sleep for `delay` (on the Tokio clock) inside every save.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make subsequent loads and saves fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> StateSnapshot {
        lock(&self.stored).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), FlowbotError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(FlowbotError::Storage {
                source: "mock storage failure".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), FlowbotError> {
        self.check()
    }

    async fn load_snapshot(&self) -> Result<StateSnapshot, FlowbotError> {
        self.check()?;
        Ok(self.stored())
    }

    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), FlowbotError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        *lock(&self.stored) = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), FlowbotError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
