// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level FlowBot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults sensibly; only
/// `discord.token` must be supplied before `serve` will start.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowbotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Discord gateway settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Focus/break timer bounds.
    #[serde(default)]
    pub timer: TimerConfig,

    /// Streak sweep schedule.
    #[serde(default)]
    pub streak: StreakConfig,

    /// Local language-model relay.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Periodic and shutdown persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in the chat preamble and logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "FlowBot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Discord gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Discord bot token. Required by `flowbot serve`.
    #[serde(default)]
    pub token: Option<String>,

    /// Register slash commands on this guild only (instant propagation).
    /// Global registration is used when unset.
    #[serde(default)]
    pub guild_id: Option<u64>,

    /// Role granted to members when they join a guild.
    #[serde(default = "default_member_role")]
    pub member_role: String,

    /// Whether to grant `member_role` and DM a welcome on join.
    #[serde(default = "default_true")]
    pub welcome_new_members: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            guild_id: None,
            member_role: default_member_role(),
            welcome_new_members: true,
        }
    }
}

fn default_member_role() -> String {
    "Members".to_string()
}

fn default_true() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. There is no default; `serve`
    /// refuses to start without one.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            wal_mode: true,
        }
    }
}

/// Focus/break timer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    /// Shortest accepted timer, in minutes.
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,

    /// Longest accepted timer, in minutes.
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,

    /// A completed focus timer at least this long counts toward the streak.
    #[serde(default = "default_qualifying_minutes")]
    pub qualifying_minutes: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            min_minutes: default_min_minutes(),
            max_minutes: default_max_minutes(),
            qualifying_minutes: default_qualifying_minutes(),
        }
    }
}

fn default_min_minutes() -> u32 {
    1
}

fn default_max_minutes() -> u32 {
    300
}

fn default_qualifying_minutes() -> u32 {
    10
}

/// Streak sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreakConfig {
    /// Seconds between sweeps over all streak records.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Local hour (0-23) at which reminders go out.
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            reminder_hour: default_reminder_hour(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_reminder_hour() -> u32 {
    17
}

/// Local language-model relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Executable that reads a prompt on stdin and writes the reply to stdout.
    #[serde(default = "default_chat_command")]
    pub command: String,

    /// Arguments passed to `command`.
    #[serde(default = "default_chat_args")]
    pub args: Vec<String>,

    /// Hard deadline for one model call.
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,

    /// Relay calls allowed per user per day (premium users are exempt).
    #[serde(default = "default_daily_quota")]
    pub daily_quota: u32,

    /// User ids exempt from the daily quota.
    #[serde(default)]
    pub premium_users: Vec<u64>,

    /// Longest reply the platform accepts, in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Preamble placed before the user's message.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            command: default_chat_command(),
            args: default_chat_args(),
            timeout_secs: default_chat_timeout_secs(),
            daily_quota: default_daily_quota(),
            premium_users: Vec::new(),
            max_message_chars: default_max_message_chars(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_chat_command() -> String {
    "ollama".to_string()
}

fn default_chat_args() -> Vec<String> {
    vec!["run".to_string(), "mistral".to_string()]
}

fn default_chat_timeout_secs() -> u64 {
    45
}

fn default_daily_quota() -> u32 {
    3
}

fn default_max_message_chars() -> usize {
    2000
}

fn default_system_prompt() -> String {
    "You are FlowBot, a helpful Discord assistant.\n\
     You are a part of the FlowBot HQ server, where you assist users with their questions \
     and provide helpful information."
        .to_string()
}

/// Persistence schedule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    /// Seconds between periodic flushes of in-memory state.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Upper bound on the final flush during shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_flush_interval_secs() -> u64 {
    60
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}
