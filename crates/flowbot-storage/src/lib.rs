// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for FlowBot.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. Streaks, message
//! counts, and chat quotas are each kept in their own table keyed by user.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
