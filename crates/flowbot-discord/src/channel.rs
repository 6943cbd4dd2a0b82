// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord channel adapter.

use std::sync::Arc;

use async_trait::async_trait;
use flowbot_config::model::{DiscordConfig, TimerConfig};
use flowbot_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, FlowbotError, HealthStatus, MessageId,
    OutboundMessage, PluginAdapter, Recipient,
};
use flowbot_engine::CommandRouter;
use serenity::all::{ChannelId, GatewayIntents, Http, ShardManager, UserId as DiscordUserId};
use serenity::Client;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::handler::Handler;

/// Discord's hard limit on message content.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Delivers engine notifications over Discord and runs the gateway client.
///
/// Sending requires [`DiscordChannel::start`] to have built the client; until
/// then every send fails with a channel error.
pub struct DiscordChannel {
    config: DiscordConfig,
    timer: TimerConfig,
    http: Mutex<Option<Arc<Http>>>,
    shards: Mutex<Option<Arc<ShardManager>>>,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig, timer: TimerConfig) -> Self {
        Self {
            config,
            timer,
            http: Mutex::new(None),
            shards: Mutex::new(None),
        }
    }

    fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
    }

    /// Connect to the gateway and route events through `router`.
    ///
    /// Returns once the client is built; the gateway runs on the returned
    /// task until [`PluginAdapter::shutdown`] stops the shards.
    pub async fn start(
        self: Arc<Self>,
        router: CommandRouter,
    ) -> Result<JoinHandle<()>, FlowbotError> {
        let token = self
            .config
            .token
            .clone()
            .ok_or_else(|| FlowbotError::Config("discord.token is not set".to_string()))?;

        let handler = Handler {
            router,
            config: self.config.clone(),
            timer: self.timer.clone(),
        };

        let mut client = Client::builder(&token, Self::intents())
            .event_handler(handler)
            .await
            .map_err(|e| FlowbotError::Channel {
                message: "failed to build Discord client".to_string(),
                source: Some(Box::new(e)),
            })?;

        *self.http.lock().await = Some(client.http.clone());
        *self.shards.lock().await = Some(client.shard_manager.clone());

        info!("starting discord gateway");
        Ok(tokio::spawn(async move {
            if let Err(e) = client.start().await {
                warn!(error = %e, "discord client stopped");
            }
        }))
    }

    async fn http(&self) -> Result<Arc<Http>, FlowbotError> {
        self.http
            .lock()
            .await
            .clone()
            .ok_or_else(|| FlowbotError::channel("Discord HTTP client not ready"))
    }
}

fn delivery_error(e: serenity::Error) -> FlowbotError {
    FlowbotError::Channel {
        message: format!("discord delivery failed: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        Ok(match self.http.lock().await.as_ref() {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("gateway not started".to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        if let Some(shards) = self.shards.lock().await.take() {
            info!("stopping discord shards");
            shards.shutdown_all().await;
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for DiscordChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_direct: true,
            max_message_length: Some(MAX_MESSAGE_LENGTH),
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, FlowbotError> {
        let http = self.http().await?;
        let sent = match msg.recipient {
            Recipient::Channel {
                channel_id,
                mention,
            } => {
                ChannelId::new(channel_id)
                    .say(&http, format!("<@{mention}> {}", msg.content))
                    .await
            }
            Recipient::Direct(user) => {
                let dm = DiscordUserId::new(user.0)
                    .create_dm_channel(&http)
                    .await
                    .map_err(delivery_error)?;
                dm.id.say(&http, msg.content).await
            }
        }
        .map_err(delivery_error)?;
        Ok(MessageId(sent.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use flowbot_core::UserId;

    use super::*;

    fn channel() -> DiscordChannel {
        DiscordChannel::new(DiscordConfig::default(), TimerConfig::default())
    }

    #[tokio::test]
    async fn send_before_start_is_a_channel_error() {
        let err = channel()
            .send(OutboundMessage::direct(UserId(1), "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowbotError::Channel { .. }));
    }

    #[tokio::test]
    async fn health_is_degraded_until_started() {
        let status = channel().health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded(_)));
    }

    #[tokio::test]
    async fn shutdown_without_gateway_is_a_no_op() {
        channel().shutdown().await.unwrap();
    }

    #[test]
    fn reports_discord_message_limit() {
        let caps = channel().capabilities();
        assert!(caps.supports_direct);
        assert_eq!(caps.max_message_length, Some(2000));
    }
}
