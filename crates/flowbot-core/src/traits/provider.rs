// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the language model behind `/chat`.

use async_trait::async_trait;

use crate::error::FlowbotError;
use crate::traits::adapter::PluginAdapter;

/// A language model that turns a prompt into a completion.
///
/// Implementations must release any external resources (child processes,
/// connections) when the returned future is dropped, so callers can impose a
/// deadline with `tokio::time::timeout`.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends the full prompt and returns the raw model output.
    async fn complete(&self, prompt: &str) -> Result<String, FlowbotError>;
}
