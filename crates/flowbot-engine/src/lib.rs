// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The FlowBot engines and the router that drives them.
//!
//! [`Engine::new`] wires the repositories, the streak engine, the timer
//! manager, the chat relay, and the persistence service around injected
//! channel, provider, storage, and clock adapters.

pub mod background;
pub mod commands;
pub mod messages;
pub mod persistence;
pub mod relay;
pub mod repository;
pub mod shutdown;
pub mod streak;
pub mod timer;

use std::sync::Arc;

use flowbot_config::FlowbotConfig;
use flowbot_core::{ChannelAdapter, Clock, ProviderAdapter, StorageAdapter};

pub use commands::{Command, CommandRouter, Invocation};
pub use persistence::PersistenceService;
pub use relay::{ChatRelay, ChatTicket, RelayRejection};
pub use repository::Repositories;
pub use streak::{StreakEngine, StreakUpdate, SweepReport};
pub use timer::{TimerCancelError, TimerManager, TimerStartError};

/// Every engine, sharing one set of repositories.
#[derive(Clone)]
pub struct Engine {
    pub repos: Repositories,
    pub streaks: Arc<StreakEngine>,
    pub timers: TimerManager,
    pub relay: Arc<ChatRelay>,
    pub persistence: Arc<PersistenceService>,
    pub router: CommandRouter,
    pub clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(
        config: &FlowbotConfig,
        channel: Arc<dyn ChannelAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let repos = Repositories::new();
        let streaks = Arc::new(StreakEngine::new(
            repos.streaks.clone(),
            channel.clone(),
            config.streak.reminder_hour,
        ));
        let timers = TimerManager::new(
            config.timer.clone(),
            streaks.clone(),
            channel,
            clock.clone(),
        );
        let relay = Arc::new(ChatRelay::new(
            config.chat.clone(),
            config.bot.name.clone(),
            provider,
            repos.chats.clone(),
            clock.clone(),
        ));
        let persistence = Arc::new(PersistenceService::new(storage, repos.clone()));
        let router = CommandRouter::new(
            timers.clone(),
            streaks.clone(),
            relay.clone(),
            repos.messages.clone(),
            clock.clone(),
        );

        Self {
            repos,
            streaks,
            timers,
            relay,
            persistence,
            router,
            clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowbot_core::UserId;
    use flowbot_test_utils::{ManualClock, MemoryStorage, MockChannel, MockProvider};

    #[tokio::test]
    async fn engine_shares_repositories_between_parts() {
        let engine = Engine::new(
            &FlowbotConfig::default(),
            Arc::new(MockChannel::new()),
            Arc::new(MockProvider::new("ok")),
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::at(2026, 1, 1, 12)),
        );
        engine.router.record_message(UserId(4));
        assert_eq!(engine.repos.messages.get(UserId(4)), 1);
        assert_eq!(engine.persistence.flush_all().await.unwrap(), 1);
    }
}
