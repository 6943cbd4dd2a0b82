// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moves state between the in-memory repositories and durable storage.

use std::sync::Arc;

use flowbot_core::{FlowbotError, StorageAdapter};
use tracing::{debug, info};

use crate::repository::Repositories;

/// Hydrates repositories at startup and flushes them back to storage.
pub struct PersistenceService {
    storage: Arc<dyn StorageAdapter>,
    repos: Repositories,
}

impl PersistenceService {
    pub fn new(storage: Arc<dyn StorageAdapter>, repos: Repositories) -> Self {
        Self { storage, repos }
    }

    /// Replace in-memory state with everything in storage.
    ///
    /// Returns the number of records loaded.
    pub async fn hydrate(&self) -> Result<usize, FlowbotError> {
        let snapshot = self.storage.load_snapshot().await?;
        let loaded = snapshot.len();
        self.repos.restore(snapshot);
        info!(records = loaded, "state hydrated from storage");
        Ok(loaded)
    }

    /// Write every in-memory record to storage.
    ///
    /// Returns the number of records written.
    pub async fn flush_all(&self) -> Result<usize, FlowbotError> {
        let snapshot = self.repos.snapshot();
        let written = snapshot.len();
        self.storage.save_snapshot(&snapshot).await?;
        debug!(records = written, "state flushed to storage");
        Ok(written)
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flowbot_core::{StateSnapshot, StreakRecord, UserId};
    use flowbot_test_utils::MemoryStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn flush_then_hydrate_reproduces_state() {
        let storage = Arc::new(MemoryStorage::new());
        let repos = Repositories::new();
        repos
            .streaks
            .upsert(UserId(1), StreakRecord::started_on(date(2026, 6, 1)));
        repos.messages.increment(UserId(1));
        repos.messages.increment(UserId(2));
        repos.chats.consume(UserId(2), date(2026, 6, 1), Some(3));

        let service = PersistenceService::new(storage.clone(), repos.clone());
        assert_eq!(service.flush_all().await.unwrap(), 4);

        let fresh = Repositories::new();
        let restored = PersistenceService::new(storage, fresh.clone());
        assert_eq!(restored.hydrate().await.unwrap(), 4);
        assert_eq!(fresh.snapshot(), repos.snapshot());
    }

    #[tokio::test]
    async fn hydrate_of_empty_storage_clears_nothing_else() {
        let storage = Arc::new(MemoryStorage::new());
        let service = PersistenceService::new(storage, Repositories::new());
        assert_eq!(service.hydrate().await.unwrap(), 0);
        assert_eq!(service.repositories().snapshot(), StateSnapshot::default());
    }

    #[tokio::test]
    async fn flush_failure_is_reported() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail(true);
        let service = PersistenceService::new(storage, Repositories::new());
        assert!(service.flush_all().await.is_err());
    }
}
