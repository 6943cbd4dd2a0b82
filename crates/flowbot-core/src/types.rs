// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the FlowBot engines.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque numeric identifier of a chat-platform user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

/// The two independent timer slots every user has.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Focus,
    Break,
}

// --- Channel types ---

/// Where an outbound message should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// A channel the user invoked a command from; the user is mentioned.
    Channel { channel_id: u64, mention: UserId },
    /// A direct message to the user.
    Direct(UserId),
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: Recipient,
    pub content: String,
}

impl OutboundMessage {
    /// A direct message to `user`.
    pub fn direct(user: UserId, content: impl Into<String>) -> Self {
        Self {
            recipient: Recipient::Direct(user),
            content: content.into(),
        }
    }

    /// A message in `channel_id` that mentions `user`.
    pub fn in_channel(channel_id: u64, user: UserId, content: impl Into<String>) -> Self {
        Self {
            recipient: Recipient::Channel {
                channel_id,
                mention: user,
            },
            content: content.into(),
        }
    }

    /// The user this message is addressed to.
    pub fn user(&self) -> UserId {
        match self.recipient {
            Recipient::Channel { mention, .. } => mention,
            Recipient::Direct(user) => user,
        }
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapabilities {
    /// Whether the channel can deliver direct messages.
    pub supports_direct: bool,
    /// Hard limit on a single message, in characters.
    pub max_message_length: Option<usize>,
}

// --- Persisted records ---

/// A user's daily focus streak.
///
/// `value` is always at least 1; a lapsed streak is deleted, never zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub value: u32,
    /// Day of month the last reminder went out (or the last qualifying day).
    pub reminded: u32,
}

impl StreakRecord {
    /// A fresh streak of 1 that started on `date`.
    pub fn started_on(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
            value: 1,
            reminded: date.day(),
        }
    }

    /// Date of the last qualifying activity, `None` if the stored fields are not a valid date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Calendar days between the last qualifying activity and `today`.
    ///
    /// An unreadable stored date counts as lapsed.
    pub fn days_since(&self, today: NaiveDate) -> i64 {
        match self.last_date() {
            Some(last) => (today - last).num_days(),
            None => i64::MAX,
        }
    }

    /// Move the last-activity date to `date` and mark the day as reminded.
    pub fn touch(&mut self, date: NaiveDate) {
        self.day = date.day();
        self.month = date.month();
        self.year = date.year();
        self.reminded = date.day();
    }
}

/// A user's relay usage for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatQuota {
    pub count: u32,
    pub day: u32,
    pub month: u32,
}

impl ChatQuota {
    /// An unused quota for `date`.
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            count: 0,
            day: date.day(),
            month: date.month(),
        }
    }

    /// Whether this quota was recorded on the same day/month as `date`.
    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.day == date.day() && self.month == date.month()
    }
}

/// Point-in-time copy of all persisted state, exchanged with storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub streaks: BTreeMap<UserId, StreakRecord>,
    pub messages: BTreeMap<UserId, u64>,
    pub chats: BTreeMap<UserId, ChatQuota>,
}

impl StateSnapshot {
    /// Total number of records across all three tables.
    pub fn len(&self) -> usize {
        self.streaks.len() + self.messages.len() + self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
