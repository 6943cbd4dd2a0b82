// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use flowbot_config::model::StorageConfig;
use flowbot_core::{
    AdapterType, FlowbotError, HealthStatus, PluginAdapter, StateSnapshot, StorageAdapter,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates row work to the typed query
/// modules. The database is lazily opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, FlowbotError> {
        self.db.get().ok_or_else(|| FlowbotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FlowbotError> {
        let path = self
            .config
            .database_path
            .as_deref()
            .ok_or_else(|| FlowbotError::Storage {
                source: "storage.database_path is not set".into(),
            })?;
        let db = Database::open(path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FlowbotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path, "SQLite storage initialized");
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<StateSnapshot, FlowbotError> {
        let snapshot = self
            .db()?
            .connection()
            .call(|conn| -> Result<StateSnapshot, rusqlite::Error> {
                Ok(StateSnapshot {
                    streaks: queries::streaks::load_all(conn)?,
                    messages: queries::messages::load_all(conn)?,
                    chats: queries::chats::load_all(conn)?,
                })
            })
            .await
            .map_err(map_tr_err)?;
        debug!(
            streaks = snapshot.streaks.len(),
            messages = snapshot.messages.len(),
            chats = snapshot.chats.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), FlowbotError> {
        let snapshot = snapshot.clone();
        let removed = self
            .db()?
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                for (user, record) in &snapshot.streaks {
                    queries::streaks::upsert(&tx, *user, record)?;
                }
                let removed = queries::streaks::delete_missing(&tx, &snapshot.streaks)?;
                for (user, count) in &snapshot.messages {
                    queries::messages::upsert(&tx, *user, *count)?;
                }
                for (user, quota) in &snapshot.chats {
                    queries::chats::upsert(&tx, *user, quota)?;
                }
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(map_tr_err)?;
        debug!(removed_streaks = removed, "snapshot saved");
        Ok(())
    }

    async fn close(&self) -> Result<(), FlowbotError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
