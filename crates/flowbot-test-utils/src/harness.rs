// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full engine with mock channel and provider
//! adapters, a manual clock, and a temp SQLite database. Tests drive it
//! through the same [`CommandRouter`] a platform adapter would use.

use std::sync::Arc;
use std::time::Duration;

use flowbot_config::model::FlowbotConfig;
use flowbot_core::{Clock, FlowbotError, StateSnapshot, StorageAdapter, UserId};
use flowbot_engine::{Command, CommandRouter, Engine, Invocation};
use flowbot_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_channel::MockChannel;
use crate::mock_provider::MockProvider;

/// Channel id every harness invocation claims to come from.
pub const HARNESS_CHANNEL_ID: u64 = 4242;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: FlowbotConfig,
    start: (i32, u32, u32, u32),
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: FlowbotConfig::default(),
            start: (2026, 3, 2, 9),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Adjust the configuration before the engine is built.
    pub fn with_config(mut self, f: impl FnOnce(&mut FlowbotConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Start the manual clock at `hour:00` on the given date.
    pub fn starting_at(mut self, year: i32, month: u32, day: u32, hour: u32) -> Self {
        self.start = (year, month, day, hour);
        self
    }

    /// Build the harness: open SQLite, wire the engine, hydrate state.
    pub async fn build(mut self) -> Result<TestHarness, FlowbotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| FlowbotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("flowbot-test.db");
        self.config.storage.database_path = Some(db_path.to_string_lossy().to_string());

        let storage = Arc::new(SqliteStorage::new(self.config.storage.clone()));
        storage.initialize().await?;

        let provider = Arc::new(if self.responses.is_empty() {
            MockProvider::new("mock response")
        } else {
            MockProvider::with_responses(self.responses)
        });
        let channel = Arc::new(MockChannel::new());
        let (year, month, day, hour) = self.start;
        let clock = Arc::new(ManualClock::at(year, month, day, hour));

        let engine = Engine::new(
            &self.config,
            channel.clone(),
            provider.clone(),
            storage.clone(),
            clock.clone(),
        );
        engine.persistence.hydrate().await?;

        Ok(TestHarness {
            engine,
            channel,
            provider,
            clock,
            storage,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete FlowBot engine for end-to-end tests.
pub struct TestHarness {
    engine: Engine,
    channel: Arc<MockChannel>,
    provider: Arc<MockProvider>,
    clock: Arc<ManualClock>,
    storage: Arc<SqliteStorage>,
    config: FlowbotConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default configuration.
    pub async fn new() -> Result<Self, FlowbotError> {
        Self::builder().build().await
    }

    /// Run `command` as `user` and return the reply.
    pub async fn command(&self, user: u64, command: Command) -> String {
        let invocation = Invocation {
            user: UserId(user),
            display_name: format!("user-{user}"),
            channel_id: Some(HARNESS_CHANNEL_ID),
        };
        self.engine.router.dispatch(&invocation, command).await
    }

    /// Count a plain chat message from `user`.
    pub fn message_from(&self, user: u64) -> u64 {
        self.engine.router.record_message(UserId(user))
    }

    /// Advance the Tokio clock and give woken timers a chance to finish.
    ///
    /// Only meaningful in a `start_paused` runtime.
    pub async fn advance_minutes(&self, minutes: u64) {
        tokio::time::advance(Duration::from_secs(minutes * 60)).await;
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    /// Run one streak sweep at the manual clock's current time.
    pub async fn sweep(&self) -> flowbot_engine::SweepReport {
        self.engine.streaks.check_all(self.engine.clock.now()).await
    }

    /// Flush in-memory state to SQLite.
    pub async fn flush(&self) -> Result<usize, FlowbotError> {
        self.engine.persistence.flush_all().await
    }

    /// Open a second connection to the database and read what is stored.
    pub async fn reload(&self) -> Result<StateSnapshot, FlowbotError> {
        let storage = SqliteStorage::new(self.config.storage.clone());
        storage.initialize().await?;
        let snapshot = storage.load_snapshot().await?;
        storage.close().await?;
        Ok(snapshot)
    }

    pub fn router(&self) -> &CommandRouter {
        &self.engine.router
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn channel(&self) -> &MockChannel {
        &self.channel
    }

    pub fn provider(&self) -> &MockProvider {
        &self.provider
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn storage(&self) -> &Arc<SqliteStorage> {
        &self.storage
    }

    pub fn config(&self) -> &FlowbotConfig {
        &self.config
    }
}
