// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-neutral command routing.
//!
//! A chat-platform adapter parses its own events into a [`Command`] plus an
//! [`Invocation`], and sends back whatever text [`CommandRouter::dispatch`]
//! returns.

use std::sync::Arc;

use flowbot_core::{Clock, Recipient, TimerKind, UserId};
use tracing::debug;

use crate::messages;
use crate::relay::ChatRelay;
use crate::repository::MessageCounter;
use crate::streak::StreakEngine;
use crate::timer::{capitalized, TimerManager};

/// Every command the bot answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Focus { minutes: i64 },
    Break { minutes: i64 },
    StopFocus,
    StopBreak,
    Track,
    Streak,
    Chat { message: String },
    Quote,
}

impl Command {
    /// Registered names, in registration order.
    pub const NAMES: [&'static str; 9] = [
        "ping",
        "focus",
        "break",
        "stop_focus",
        "stop_break",
        "track",
        "streak",
        "chat",
        "quote",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Focus { .. } => "focus",
            Self::Break { .. } => "break",
            Self::StopFocus => "stop_focus",
            Self::StopBreak => "stop_break",
            Self::Track => "track",
            Self::Streak => "streak",
            Self::Chat { .. } => "chat",
            Self::Quote => "quote",
        }
    }
}

/// Who invoked a command and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub user: UserId,
    pub display_name: String,
    /// Channel the command came from; `None` for direct messages.
    pub channel_id: Option<u64>,
}

impl Invocation {
    /// Where deferred notices for this invocation should go.
    pub fn notify_target(&self) -> Recipient {
        match self.channel_id {
            Some(channel_id) => Recipient::Channel {
                channel_id,
                mention: self.user,
            },
            None => Recipient::Direct(self.user),
        }
    }
}

/// Routes commands to the engines and renders their outcomes as text.
#[derive(Clone)]
pub struct CommandRouter {
    timers: TimerManager,
    streaks: Arc<StreakEngine>,
    relay: Arc<ChatRelay>,
    messages: Arc<MessageCounter>,
    clock: Arc<dyn Clock>,
}

impl CommandRouter {
    pub fn new(
        timers: TimerManager,
        streaks: Arc<StreakEngine>,
        relay: Arc<ChatRelay>,
        messages: Arc<MessageCounter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            timers,
            streaks,
            relay,
            messages,
            clock,
        }
    }

    /// Run `command` for `invocation` and return the reply text.
    pub async fn dispatch(&self, invocation: &Invocation, command: Command) -> String {
        debug!(user_id = %invocation.user, command = command.name(), "dispatching command");
        let user = invocation.user;
        match command {
            Command::Ping => "pong".to_string(),
            Command::Focus { minutes } => self.start_timer(invocation, TimerKind::Focus, minutes),
            Command::Break { minutes } => self.start_timer(invocation, TimerKind::Break, minutes),
            Command::StopFocus => self.stop_timer(user, TimerKind::Focus),
            Command::StopBreak => self.stop_timer(user, TimerKind::Break),
            Command::Track => match self.messages.get(user) {
                0 => "You haven't sent any messages yet!".to_string(),
                count => format!("You have sent {count} messages"),
            },
            Command::Streak => match self.streaks.current(user, self.clock.now().date()) {
                Some(value) => format!("Your focus streak is {value} 🔥"),
                None => "No active streak. Start a focus timer to build your streak!".to_string(),
            },
            Command::Chat { message } => self
                .relay
                .relay(user, &invocation.display_name, &message)
                .await
                .unwrap_or_else(|rejection| rejection.to_string()),
            Command::Quote => messages::random_quote().to_string(),
        }
    }

    /// Count one observed message from `user`.
    pub fn record_message(&self, user: UserId) -> u64 {
        self.messages.increment(user)
    }

    /// The chat relay, for adapters that acknowledge before the model call.
    pub fn relay(&self) -> &ChatRelay {
        &self.relay
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    fn start_timer(&self, invocation: &Invocation, kind: TimerKind, minutes: i64) -> String {
        match self
            .timers
            .start(invocation.user, kind, minutes, invocation.notify_target())
        {
            Ok(()) => format!("{} timer started.", capitalized(&kind)),
            Err(rejection) => rejection.to_string(),
        }
    }

    fn stop_timer(&self, user: UserId, kind: TimerKind) -> String {
        match self.timers.cancel(user, kind) {
            Ok(()) => format!("{} timer stopped", capitalized(&kind)),
            Err(rejection) => rejection.to_string(),
        }
    }
}
