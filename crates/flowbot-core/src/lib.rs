// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for FlowBot.
//!
//! This crate provides the trait definitions, error type, record types, and
//! clock abstraction shared by every other crate in the workspace. The
//! storage, language-model, and chat-platform adapters all implement traits
//! defined here.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::FlowbotError;
pub use types::{
    AdapterType, ChannelCapabilities, ChatQuota, HealthStatus, MessageId, OutboundMessage,
    Recipient, StateSnapshot, StreakRecord, TimerKind, UserId,
};

pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn flowbot_error_has_all_variants() {
        let _config = FlowbotError::Config("test".into());
        let _storage = FlowbotError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = FlowbotError::channel("test");
        let _provider = FlowbotError::provider("test");
        let _timeout = FlowbotError::Timeout {
            duration: std::time::Duration::from_secs(45),
        };
        let _internal = FlowbotError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Channel, AdapterType::Provider, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn timer_kind_displays_lowercase() {
        assert_eq!(TimerKind::Focus.to_string(), "focus");
        assert_eq!(TimerKind::Break.to_string(), "break");
        let json = serde_json::to_string(&TimerKind::Break).unwrap();
        assert_eq!(json, "\"break\"");
    }

    #[test]
    fn streak_days_since_uses_calendar_days() {
        let record = StreakRecord::started_on(date(2026, 2, 28));
        assert_eq!(record.value, 1);
        assert_eq!(record.reminded, 28);
        assert_eq!(record.days_since(date(2026, 2, 28)), 0);
        assert_eq!(record.days_since(date(2026, 3, 1)), 1);
        assert_eq!(record.days_since(date(2026, 3, 2)), 2);
    }

    #[test]
    fn streak_days_since_crosses_year_boundary() {
        let record = StreakRecord::started_on(date(2025, 12, 31));
        assert_eq!(record.days_since(date(2026, 1, 1)), 1);
    }

    #[test]
    fn invalid_stored_date_counts_as_lapsed() {
        let record = StreakRecord {
            day: 31,
            month: 2,
            year: 2026,
            value: 4,
            reminded: 1,
        };
        assert!(record.last_date().is_none());
        assert!(record.days_since(date(2026, 3, 1)) >= 2);
    }

    #[test]
    fn touch_moves_date_and_reminded_day() {
        let mut record = StreakRecord::started_on(date(2026, 3, 1));
        record.touch(date(2026, 3, 2));
        assert_eq!((record.year, record.month, record.day), (2026, 3, 2));
        assert_eq!(record.reminded, 2);
        assert_eq!(record.value, 1);
    }

    #[test]
    fn chat_quota_matches_day_and_month_only() {
        let quota = ChatQuota::fresh(date(2026, 3, 5));
        assert!(quota.is_for(date(2026, 3, 5)));
        assert!(quota.is_for(date(2027, 3, 5)));
        assert!(!quota.is_for(date(2026, 3, 6)));
        assert!(!quota.is_for(date(2026, 4, 5)));
    }

    #[test]
    fn outbound_message_reports_addressee() {
        let dm = OutboundMessage::direct(UserId(7), "hi");
        assert_eq!(dm.user(), UserId(7));
        let ch = OutboundMessage::in_channel(99, UserId(8), "hi");
        assert_eq!(ch.user(), UserId(8));
        assert!(matches!(ch.recipient, Recipient::Channel { channel_id: 99, .. }));
    }

    #[test]
    fn snapshot_len_counts_all_tables() {
        let mut snapshot = StateSnapshot::default();
        assert!(snapshot.is_empty());
        snapshot.messages.insert(UserId(1), 3);
        snapshot
            .chats
            .insert(UserId(1), ChatQuota::fresh(date(2026, 1, 1)));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
