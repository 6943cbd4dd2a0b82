// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use flowbot_core::FlowbotError;
use tracing::{debug, info};

use crate::migrations;

/// Scheme prefix accepted on `DATABASE_URL`-style paths.
const SQLITE_SCHEME: &str = "sqlite://";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the single SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// A leading `sqlite://` is stripped, and `:memory:` opens a private
    /// in-memory database.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, FlowbotError> {
        let path = normalize_path(path);
        let conn = if path == ":memory:" {
            tokio_rusqlite::Connection::open_in_memory().await
        } else {
            if let Some(parent) = Path::new(&path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| FlowbotError::Storage {
                    source: Box::new(e),
                })?;
            }
            tokio_rusqlite::Connection::open(&path).await
        }
        .map_err(|e| FlowbotError::Storage {
            source: e.to_string().into(),
        })?;

        let migrated = conn
            .call(move |conn| -> Result<_, rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
            .map_err(|e| FlowbotError::Storage {
                source: Box::new(e),
            })?;

        if migrated > 0 {
            info!(path = %path, applied = migrated, "database migrations applied");
        }
        debug!(path = %path, wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// The tokio-rusqlite connection every query goes through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Path the database was opened at, after normalization.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), FlowbotError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into [`FlowbotError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FlowbotError {
    FlowbotError::Storage {
        source: e.to_string().into(),
    }
}

fn normalize_path(path: &str) -> String {
    path.strip_prefix(SQLITE_SCHEME).unwrap_or(path).to_string()
}

/// Convert a platform user id to SQLite's signed integer.
pub(crate) fn to_sql_id(id: u64) -> Result<i64, rusqlite::Error> {
    i64::try_from(id).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Convert a stored signed integer back to an unsigned count or id.
pub(crate) fn from_sql_u64(idx: usize, value: i64) -> Result<u64, rusqlite::Error> {
    u64::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Integer, Box::new(e))
    })
}
