// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::FlowbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::StateSnapshot;

/// Adapter for the durable store behind the in-memory repositories.
///
/// The store never holds live state: it receives whole snapshots to write
/// and hands a snapshot back at startup.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (open, migrations).
    async fn initialize(&self) -> Result<(), FlowbotError>;

    /// Reads every persisted record.
    async fn load_snapshot(&self) -> Result<StateSnapshot, FlowbotError>;

    /// Upserts every record in `snapshot`.
    ///
    /// Streak rows absent from the snapshot are deleted, since a lapsed
    /// streak is removed from memory rather than zeroed.
    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), FlowbotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FlowbotError>;
}
