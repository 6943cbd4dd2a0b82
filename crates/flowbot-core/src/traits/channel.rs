// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for outbound delivery to the chat platform.

use async_trait::async_trait;

use crate::error::FlowbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, MessageId, OutboundMessage};

/// Delivers notifications (timer completions, streak reminders) that are not
/// direct replies to a command.
///
/// Command replies travel through the platform's own interaction response;
/// everything the engines emit on their own schedule goes through here.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FlowbotError>;
}
