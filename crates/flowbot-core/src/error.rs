// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for FlowBot.

use thiserror::Error;

/// The primary error type used across all FlowBot adapter traits and engines.
#[derive(Debug, Error)]
pub enum FlowbotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (gateway failure, forbidden DM, unknown recipient).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language-model provider errors (spawn failure, non-zero exit, bad output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowbotError {
    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}
