// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat quota table operations.

use std::collections::BTreeMap;

use flowbot_core::{ChatQuota, UserId};
use rusqlite::{params, Connection};

use crate::database::{from_sql_u64, to_sql_id};

/// Read every chat quota row.
pub fn load_all(conn: &Connection) -> Result<BTreeMap<UserId, ChatQuota>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT user_id, count, day, month FROM chats")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            UserId(from_sql_u64(0, row.get(0)?)?),
            ChatQuota {
                count: row.get(1)?,
                day: row.get(2)?,
                month: row.get(3)?,
            },
        ))
    })?;
    rows.collect()
}

/// Insert or overwrite one user's quota.
pub fn upsert(conn: &Connection, user: UserId, quota: &ChatQuota) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO chats (user_id, count, day, month) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             count = excluded.count,
             day = excluded.day,
             month = excluded.month",
        params![to_sql_id(user.0)?, quota.count, quota.day, quota.month],
    )?;
    Ok(())
}
