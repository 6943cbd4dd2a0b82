// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat relay to the local language model.
//!
//! Admission (single in-flight call per user, daily quota) is separated from
//! the model call so a platform adapter can acknowledge the command between
//! the two.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashSet;
use flowbot_config::model::ChatConfig;
use flowbot_core::{Clock, ProviderAdapter, UserId};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::repository::{ChatQuotaRepository, QuotaDecision};

/// Appended to replies cut to the transport limit.
pub const TRUNCATION_MARKER: &str = "...";

pub const TIMEOUT_REPLY: &str = "⏱️ Model timed out.";
pub const EMPTY_REPLY: &str = "⚠️ No response from model.";
pub const FAILURE_REPLY: &str = "⚠️ The model failed to respond.";

/// CSI and two-byte escape sequences emitted by terminal-oriented CLIs.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B[@-_][0-?]*[ -/]*[@-~]").expect("valid ANSI escape regex")
});

/// Why a chat request was turned away before reaching the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayRejection {
    #[error("You are already chatting.")]
    AlreadyChatting,
    #[error(
        "Daily chat limit reached. Only selected users can use the chat command more than {limit} times a day, because the bot is still in its early stages and we want to ensure a good experience for everyone. Please try again tomorrow!"
    )]
    QuotaExceeded { limit: u32 },
}

/// Relays one user message at a time per user to a [`ProviderAdapter`].
pub struct ChatRelay {
    provider: Arc<dyn ProviderAdapter>,
    quotas: Arc<ChatQuotaRepository>,
    clock: Arc<dyn Clock>,
    in_flight: DashSet<UserId>,
    premium: HashSet<UserId>,
    assistant_name: String,
    config: ChatConfig,
}

/// Releases the user's in-flight slot when dropped.
struct InFlightGuard<'a> {
    slots: &'a DashSet<UserId>,
    user: UserId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots.remove(&self.user);
    }
}

/// An admitted chat request holding the user's in-flight slot.
pub struct ChatTicket<'a> {
    relay: &'a ChatRelay,
    user: UserId,
    _guard: InFlightGuard<'a>,
}

impl ChatRelay {
    pub fn new(
        config: ChatConfig,
        assistant_name: impl Into<String>,
        provider: Arc<dyn ProviderAdapter>,
        quotas: Arc<ChatQuotaRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            premium: config.premium_users.iter().copied().map(UserId).collect(),
            provider,
            quotas,
            clock,
            in_flight: DashSet::new(),
            assistant_name: assistant_name.into(),
            config,
        }
    }

    /// Claim the user's in-flight slot and one unit of today's quota.
    pub fn admit(&self, user: UserId) -> Result<ChatTicket<'_>, RelayRejection> {
        if !self.in_flight.insert(user) {
            debug!(user_id = %user, "chat rejected: already in flight");
            return Err(RelayRejection::AlreadyChatting);
        }
        let guard = InFlightGuard {
            slots: &self.in_flight,
            user,
        };

        let limit = (!self.premium.contains(&user)).then_some(self.config.daily_quota);
        let today = self.clock.now().date();
        match self.quotas.consume(user, today, limit) {
            QuotaDecision::Granted { used } => {
                debug!(user_id = %user, used, "chat admitted");
                Ok(ChatTicket {
                    relay: self,
                    user,
                    _guard: guard,
                })
            }
            QuotaDecision::Exhausted { limit } => {
                debug!(user_id = %user, limit, "chat rejected: quota exhausted");
                Err(RelayRejection::QuotaExceeded { limit })
            }
        }
    }

    /// Admit and answer in one step.
    pub async fn relay(
        &self,
        user: UserId,
        display_name: &str,
        text: &str,
    ) -> Result<String, RelayRejection> {
        let ticket = self.admit(user)?;
        Ok(ticket.respond(display_name, text).await)
    }

    pub fn is_chatting(&self, user: UserId) -> bool {
        self.in_flight.contains(&user)
    }

    fn prompt(&self, display_name: &str, text: &str) -> String {
        format!(
            "{}\n\n{display_name}: {text}\n{}:",
            self.config.system_prompt.trim_end(),
            self.assistant_name
        )
    }
}

impl ChatTicket<'_> {
    /// Ask the model and return a reply ready for the transport.
    ///
    /// Never fails: timeouts, provider errors, and empty output all map to a
    /// placeholder reply. The in-flight slot is released when the ticket drops.
    pub async fn respond(self, display_name: &str, text: &str) -> String {
        let relay = self.relay;
        let prompt = relay.prompt(display_name, text);
        let deadline = Duration::from_secs(relay.config.timeout_secs);

        let reply = match tokio::time::timeout(deadline, relay.provider.complete(&prompt)).await {
            Err(_) => {
                warn!(user_id = %self.user, timeout_secs = relay.config.timeout_secs, "model timed out");
                TIMEOUT_REPLY.to_string()
            }
            Ok(Err(e)) => {
                warn!(user_id = %self.user, error = %e, "model call failed");
                FAILURE_REPLY.to_string()
            }
            Ok(Ok(raw)) => {
                let cleaned = strip_ansi(&raw);
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    cleaned.to_string()
                }
            }
        };
        truncate(&reply, relay.config.max_message_chars)
    }
}

/// Remove terminal escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Cut `text` to at most `max_chars` characters, ending in the truncation
/// marker when anything was removed.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowbot_test_utils::{ManualClock, MockProvider};
    use proptest::prelude::*;

    fn relay_with(provider: MockProvider, config: ChatConfig) -> (ChatRelay, Arc<MockProvider>, Arc<ManualClock>) {
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::at(2026, 2, 10, 12));
        let relay = ChatRelay::new(
            config,
            "FlowBot",
            provider.clone(),
            Arc::new(ChatQuotaRepository::new()),
            clock.clone(),
        );
        (relay, provider, clock)
    }

    #[test]
    fn strips_color_and_cursor_sequences() {
        assert_eq!(strip_ansi("\x1b[32mhello\x1b[0m"), "hello");
        assert_eq!(strip_ansi("a\x1b[?25lb\x1b[2Kc"), "abc");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn truncation_keeps_marker_and_limit() {
        let long = "x".repeat(2500);
        let out = truncate(&long, 2000);
        assert_eq!(out.chars().count(), 2000);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncate("short", 2000), "short");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let out = truncate(&text, 5);
        assert_eq!(out, "éé...");
    }

    #[tokio::test]
    async fn prompt_carries_preamble_name_and_message() {
        let (relay, provider, _) = relay_with(MockProvider::new("hi"), ChatConfig::default());
        relay.relay(UserId(1), "Ada", "what is rust?").await.unwrap();
        let prompt = provider.prompts().pop().unwrap();
        assert!(prompt.starts_with("You are FlowBot"));
        assert!(prompt.ends_with("\n\nAda: what is rust?\nFlowBot:"));
    }

    #[tokio::test]
    async fn reply_is_cleaned_and_trimmed() {
        let (relay, _, _) =
            relay_with(MockProvider::new("  \x1b[1mAnswer\x1b[0m\n"), ChatConfig::default());
        assert_eq!(relay.relay(UserId(1), "Ada", "q").await.unwrap(), "Answer");
    }

    #[tokio::test]
    async fn empty_output_yields_placeholder() {
        let (relay, _, _) = relay_with(MockProvider::new("\x1b[0m \n"), ChatConfig::default());
        assert_eq!(relay.relay(UserId(1), "Ada", "q").await.unwrap(), EMPTY_REPLY);
    }

    #[tokio::test]
    async fn provider_failure_yields_placeholder_and_releases_slot() {
        let (relay, _, _) = relay_with(MockProvider::failing(), ChatConfig::default());
        assert_eq!(relay.relay(UserId(1), "Ada", "q").await.unwrap(), FAILURE_REPLY);
        assert!(!relay.is_chatting(UserId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out() {
        let config = ChatConfig {
            timeout_secs: 45,
            ..ChatConfig::default()
        };
        let provider = MockProvider::new("late").with_delay(Duration::from_secs(120));
        let (relay, _, _) = relay_with(provider, config);
        assert_eq!(relay.relay(UserId(1), "Ada", "q").await.unwrap(), TIMEOUT_REPLY);
        assert!(!relay.is_chatting(UserId(1)));
    }

    #[tokio::test]
    async fn second_concurrent_call_is_rejected() {
        let (relay, _, _) = relay_with(MockProvider::new("ok"), ChatConfig::default());
        let ticket = relay.admit(UserId(1)).unwrap();
        assert_eq!(relay.admit(UserId(1)).err(), Some(RelayRejection::AlreadyChatting));
        // Other users are unaffected.
        assert!(relay.admit(UserId(2)).is_ok());

        assert_eq!(ticket.respond("Ada", "q").await, "ok");
        assert!(relay.admit(UserId(1)).is_ok());
    }

    #[tokio::test]
    async fn fourth_call_of_the_day_is_rejected_until_tomorrow() {
        let (relay, provider, clock) = relay_with(MockProvider::new("ok"), ChatConfig::default());
        for _ in 0..3 {
            relay.relay(UserId(1), "Ada", "q").await.unwrap();
        }
        assert_eq!(
            relay.relay(UserId(1), "Ada", "q").await,
            Err(RelayRejection::QuotaExceeded { limit: 3 })
        );
        assert_eq!(provider.calls(), 3);
        assert!(!relay.is_chatting(UserId(1)));

        clock.advance_days(1);
        assert!(relay.relay(UserId(1), "Ada", "q").await.is_ok());
    }

    #[tokio::test]
    async fn premium_users_are_exempt() {
        let config = ChatConfig {
            premium_users: vec![42],
            ..ChatConfig::default()
        };
        let (relay, _, _) = relay_with(MockProvider::new("ok"), config);
        for _ in 0..6 {
            assert!(relay.relay(UserId(42), "Vip", "q").await.is_ok());
        }
    }

    #[tokio::test]
    async fn long_reply_is_cut_to_transport_limit() {
        let config = ChatConfig {
            max_message_chars: 100,
            ..ChatConfig::default()
        };
        let (relay, _, _) = relay_with(MockProvider::new("word ".repeat(100)), config);
        let reply = relay.relay(UserId(1), "Ada", "q").await.unwrap();
        assert_eq!(reply.chars().count(), 100);
        assert!(reply.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn rejection_texts() {
        assert_eq!(RelayRejection::AlreadyChatting.to_string(), "You are already chatting.");
        assert!(
            RelayRejection::QuotaExceeded { limit: 3 }
                .to_string()
                .starts_with("Daily chat limit reached.")
        );
    }

    proptest! {
        #[test]
        fn truncate_never_exceeds_limit(text in ".{0,300}", max in 4usize..200) {
            let out = truncate(&text, max);
            prop_assert!(out.chars().count() <= max);
            if text.chars().count() > max {
                prop_assert!(out.ends_with(TRUNCATION_MARKER));
            } else {
                prop_assert_eq!(out, text);
            }
        }
    }
}
