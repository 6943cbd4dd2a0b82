// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` and captures every outbound
//! message for assertion. It can be switched into a failing mode to
//! exercise delivery-error paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use flowbot_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, FlowbotError, HealthStatus, MessageId,
    OutboundMessage, PluginAdapter, UserId,
};

use crate::lock;

/// A mock messaging channel for testing.
#[derive(Debug, Default)]
pub struct MockChannel {
    sent: Mutex<Vec<OutboundMessage>>,
    fail: AtomicBool,
    shut_down: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    /// Create a new mock channel with nothing sent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message successfully passed to `send()`, in order.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        lock(&self.sent).clone()
    }

    /// Text of every message addressed to `user`.
    pub fn contents_for(&self, user: UserId) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter(|m| m.user() == user)
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn clear_sent(&self) {
        lock(&self.sent).clear();
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_direct: true,
            max_message_length: Some(2000),
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FlowbotError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FlowbotError::channel(format!(
                "mock delivery to {} refused",
                msg.user()
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.sent).push(msg);
        Ok(MessageId(format!("mock-msg-{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_sent_messages() {
        let channel = MockChannel::new();
        channel
            .send(OutboundMessage::direct(UserId(1), "hello"))
            .await
            .unwrap();
        channel
            .send(OutboundMessage::in_channel(9, UserId(2), "there"))
            .await
            .unwrap();
        assert_eq!(channel.sent_messages().len(), 2);
        assert_eq!(channel.contents_for(UserId(2)), vec!["there"]);
        channel.clear_sent();
        assert!(channel.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn failing_mode_rejects_and_records_nothing() {
        let channel = MockChannel::new();
        channel.set_fail(true);
        let result = channel.send(OutboundMessage::direct(UserId(1), "x")).await;
        assert!(matches!(result, Err(FlowbotError::Channel { .. })));
        assert!(channel.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn shutdown_is_observable() {
        let channel = MockChannel::new();
        assert!(!channel.is_shut_down());
        channel.shutdown().await.unwrap();
        assert!(channel.is_shut_down());
    }
}
