// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord adapter for FlowBot.
//!
//! [`DiscordChannel`] delivers engine notifications and, once started, runs
//! the serenity gateway client whose event handler parses slash commands,
//! counts messages, and welcomes new members.

pub mod channel;
pub mod commands;
pub mod handler;

pub use channel::DiscordChannel;
pub use commands::ParseError;
