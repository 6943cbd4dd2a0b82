// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message count table operations.

use std::collections::BTreeMap;

use flowbot_core::UserId;
use rusqlite::{params, Connection};

use crate::database::{from_sql_u64, to_sql_id};

/// Read every message count.
pub fn load_all(conn: &Connection) -> Result<BTreeMap<UserId, u64>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT user_id, count FROM messages")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            UserId(from_sql_u64(0, row.get(0)?)?),
            from_sql_u64(1, row.get(1)?)?,
        ))
    })?;
    rows.collect()
}

/// Insert or overwrite one user's count.
pub fn upsert(conn: &Connection, user: UserId, count: u64) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO messages (user_id, count) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET count = excluded.count",
        params![to_sql_id(user.0)?, to_sql_id(count)?],
    )?;
    Ok(())
}
