// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streak table operations.

use std::collections::BTreeMap;

use flowbot_core::{StreakRecord, UserId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{from_sql_u64, to_sql_id};

/// Read every streak row.
pub fn load_all(conn: &Connection) -> Result<BTreeMap<UserId, StreakRecord>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT user_id, day, month, year, value, reminded FROM streaks")?;
    let rows = stmt.query_map([], |row| {
        let user = from_sql_u64(0, row.get(0)?)?;
        Ok((
            UserId(user),
            StreakRecord {
                day: row.get(1)?,
                month: row.get(2)?,
                year: row.get(3)?,
                value: row.get(4)?,
                reminded: row.get(5)?,
            },
        ))
    })?;
    rows.collect()
}

/// Read one user's streak.
pub fn get(conn: &Connection, user: UserId) -> Result<Option<StreakRecord>, rusqlite::Error> {
    conn.query_row(
        "SELECT day, month, year, value, reminded FROM streaks WHERE user_id = ?1",
        params![to_sql_id(user.0)?],
        |row| {
            Ok(StreakRecord {
                day: row.get(0)?,
                month: row.get(1)?,
                year: row.get(2)?,
                value: row.get(3)?,
                reminded: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Insert or overwrite one user's streak.
pub fn upsert(conn: &Connection, user: UserId, record: &StreakRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO streaks (user_id, day, month, year, value, reminded)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
             day = excluded.day,
             month = excluded.month,
             year = excluded.year,
             value = excluded.value,
             reminded = excluded.reminded",
        params![
            to_sql_id(user.0)?,
            record.day,
            record.month,
            record.year,
            record.value,
            record.reminded,
        ],
    )?;
    Ok(())
}

/// Delete every streak row whose user is not in `keep`. Returns the number removed.
pub fn delete_missing(
    conn: &Connection,
    keep: &BTreeMap<UserId, StreakRecord>,
) -> Result<usize, rusqlite::Error> {
    let stored: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT user_id FROM streaks")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };

    let mut removed = 0;
    for id in stored {
        let present = u64::try_from(id).is_ok_and(|user| keep.contains_key(&UserId(user)));
        if !present {
            removed += conn.execute("DELETE FROM streaks WHERE user_id = ?1", params![id])?;
        }
    }
    Ok(removed)
}
