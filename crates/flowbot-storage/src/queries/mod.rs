// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed row operations, one module per table.
//!
//! Functions take a borrowed `rusqlite::Connection` so the adapter can run
//! several of them inside one transaction on the writer thread.

pub mod chats;
pub mod messages;
pub mod streaks;
