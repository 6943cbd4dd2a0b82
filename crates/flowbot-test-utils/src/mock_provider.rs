// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language-model provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! an optional artificial delay, and an optional failure mode.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use flowbot_core::{AdapterType, FlowbotError, HealthStatus, PluginAdapter, ProviderAdapter};

use crate::lock;

/// A mock provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue; the last one repeats once the
/// queue is down to a single entry.
#[derive(Debug)]
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockProvider {
    /// A provider that always answers `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_responses(vec![response.into()])
    }

    /// A provider that answers with `responses` in order, repeating the last.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            prompts: Mutex::new(Vec::new()),
            delay: None,
            fail: false,
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_responses(Vec::new())
        }
    }

    /// Sleep for `delay` (on the Tokio clock) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    fn next_response(&self) -> String {
        let mut responses = lock(&self.responses);
        if responses.len() > 1 {
            responses.pop_front().unwrap_or_default()
        } else {
            responses.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, FlowbotError> {
        lock(&self.prompts).push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(FlowbotError::provider("mock provider failure"));
        }
        Ok(self.next_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_play_in_order_then_repeat() {
        let provider = MockProvider::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(provider.complete("a").await.unwrap(), "one");
        assert_eq!(provider.complete("b").await.unwrap(), "two");
        assert_eq!(provider.complete("c").await.unwrap(), "two");
        assert_eq!(provider.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockProvider::failing();
        assert!(provider.complete("x").await.is_err());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_uses_tokio_clock() {
        let provider = MockProvider::new("late").with_delay(Duration::from_secs(60));
        let start = tokio::time::Instant::now();
        assert_eq!(provider.complete("x").await.unwrap(), "late");
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
