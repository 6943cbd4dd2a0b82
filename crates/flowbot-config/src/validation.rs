// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as timer bounds and non-zero intervals.

use crate::diagnostic::ConfigError;
use crate::model::FlowbotConfig;

/// Length of the marker the relay appends to truncated replies.
pub const TRUNCATION_MARKER_LEN: usize = 3;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FlowbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config
        .storage
        .database_path
        .as_deref()
        .is_some_and(|path| path.trim().is_empty())
    {
        fail("storage.database_path must not be empty".to_string());
    }

    let timer = &config.timer;
    if timer.min_minutes == 0 {
        fail("timer.min_minutes must be at least 1".to_string());
    }
    if timer.min_minutes > timer.max_minutes {
        fail(format!(
            "timer.min_minutes ({}) must not exceed timer.max_minutes ({})",
            timer.min_minutes, timer.max_minutes
        ));
    }

    if config.streak.reminder_hour > 23 {
        fail(format!(
            "streak.reminder_hour must be between 0 and 23, got {}",
            config.streak.reminder_hour
        ));
    }
    if config.streak.sweep_interval_secs == 0 {
        fail("streak.sweep_interval_secs must be greater than 0".to_string());
    }

    if config.chat.command.trim().is_empty() {
        fail("chat.command must not be empty".to_string());
    }
    if config.chat.timeout_secs == 0 {
        fail("chat.timeout_secs must be greater than 0".to_string());
    }
    if config.chat.max_message_chars <= TRUNCATION_MARKER_LEN {
        fail(format!(
            "chat.max_message_chars must be greater than {TRUNCATION_MARKER_LEN}, got {}",
            config.chat.max_message_chars
        ));
    }

    if config.persistence.flush_interval_secs == 0 {
        fail("persistence.flush_interval_secs must be greater than 0".to_string());
    }
    if config.persistence.shutdown_timeout_secs == 0 {
        fail("persistence.shutdown_timeout_secs must be greater than 0".to_string());
    }

    if config
        .discord
        .token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        fail("discord.token must not be blank when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that only `serve` needs: the platform token and the database
/// location must both be given explicitly.
pub fn validate_for_serve(config: &FlowbotConfig) -> Result<(), Vec<ConfigError>> {
    validate_config(config)?;
    let mut missing = Vec::new();
    if config.discord.token.is_none() {
        missing.push(ConfigError::MissingKey {
            key: "discord.token".to_string(),
        });
    }
    if config.storage.database_path.is_none() {
        missing.push(ConfigError::MissingKey {
            key: "storage.database_path".to_string(),
        });
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = FlowbotConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = FlowbotConfig::default();
        config.storage.database_path = Some("".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn inverted_timer_bounds_fail_validation() {
        let mut config = FlowbotConfig::default();
        config.timer.min_minutes = 30;
        config.timer.max_minutes = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must not exceed"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = FlowbotConfig::default();
        config.streak.reminder_hour = 24;
        config.chat.timeout_secs = 0;
        config.chat.max_message_chars = 2;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "reminder_hour"));
        assert!(has_message(&errors, "timeout_secs"));
        assert!(has_message(&errors, "max_message_chars"));
    }

    #[test]
    fn blank_token_fails_validation() {
        let mut config = FlowbotConfig::default();
        config.discord.token = Some("   ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "discord.token"));
    }

    #[test]
    fn zero_shutdown_timeout_fails_validation() {
        let mut config = FlowbotConfig::default();
        config.persistence.shutdown_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_message(&errors, "shutdown_timeout_secs"));
    }

    #[test]
    fn zero_intervals_fail_validation() {
        let mut config = FlowbotConfig::default();
        config.persistence.flush_interval_secs = 0;
        config.streak.sweep_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "flush_interval_secs"));
        assert!(has_message(&errors, "sweep_interval_secs"));
    }

    fn missing_keys(errors: &[ConfigError]) -> Vec<&str> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::MissingKey { key } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn serve_requires_token_and_database_path() {
        let config = FlowbotConfig::default();
        let errors = validate_for_serve(&config).unwrap_err();
        assert_eq!(
            missing_keys(&errors),
            vec!["discord.token", "storage.database_path"]
        );

        let mut config = FlowbotConfig::default();
        config.discord.token = Some("abc".to_string());
        let errors = validate_for_serve(&config).unwrap_err();
        assert_eq!(missing_keys(&errors), vec!["storage.database_path"]);

        config.storage.database_path = Some("/tmp/flowbot.db".to_string());
        assert!(validate_for_serve(&config).is_ok());
    }
}
