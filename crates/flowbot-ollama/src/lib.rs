// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama CLI provider adapter for FlowBot.
//!
//! Runs the configured inference command (by default `ollama run mistral`)
//! once per request, writes the prompt to its stdin, and returns whatever
//! it prints on stdout. Deadlines are enforced by the caller; dropping the
//! returned future kills the child process.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use flowbot_config::model::ChatConfig;
use flowbot_core::{AdapterType, FlowbotError, HealthStatus, PluginAdapter, ProviderAdapter};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Set on every child so the CLI does not draw a progress spinner.
const NO_SPINNER_ENV: &str = "OLLAMA_NO_SPINNER";

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Language-model provider backed by a local command-line program.
#[derive(Debug, Clone)]
pub struct OllamaCliProvider {
    command: String,
    args: Vec<String>,
}

impl OllamaCliProvider {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    /// The full command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spawn_error(&self, e: std::io::Error) -> FlowbotError {
        FlowbotError::Provider {
            message: format!("failed to start `{}`: {e}", self.command_line()),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl PluginAdapter for OllamaCliProvider {
    fn name(&self) -> &str {
        "ollama-cli"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowbotError> {
        let version = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        Ok(match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, version).await {
            Ok(Ok(status)) if status.success() => HealthStatus::Healthy,
            Ok(Ok(status)) => {
                HealthStatus::Degraded(format!("`{} --version` exited with {status}", self.command))
            }
            Ok(Err(e)) => HealthStatus::Unhealthy(format!("`{}` not runnable: {e}", self.command)),
            Err(_) => HealthStatus::Degraded(format!("`{} --version` timed out", self.command)),
        })
    }

    async fn shutdown(&self) -> Result<(), FlowbotError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaCliProvider {
    async fn complete(&self, prompt: &str) -> Result<String, FlowbotError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .env(NO_SPINNER_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A child that exits without reading closes the pipe; its
                // exit status decides the outcome.
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    debug!(error = %e, "prompt write interrupted");
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| FlowbotError::Provider {
            message: format!("failed to read output of `{}`: {e}", self.command_line()),
            source: Some(Box::new(e)),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FlowbotError::provider(format!(
                "`{}` exited with {}: {}",
                self.command_line(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = stdout.len(), "model output received");
        Ok(stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> OllamaCliProvider {
        OllamaCliProvider::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn defaults_come_from_chat_config() {
        let provider = OllamaCliProvider::from_config(&ChatConfig::default());
        assert_eq!(provider.command_line(), "ollama run mistral");
    }

    #[tokio::test]
    async fn prompt_goes_to_stdin_and_stdout_comes_back() {
        let provider = OllamaCliProvider::new("cat", Vec::new());
        let output = provider.complete("hello model").await.unwrap();
        assert_eq!(output, "hello model");
    }

    #[tokio::test]
    async fn no_spinner_variable_is_set() {
        let provider = sh("printf %s \"$OLLAMA_NO_SPINNER\"");
        assert_eq!(provider.complete("").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_provider_error() {
        let provider = sh("echo boom >&2; exit 3");
        match provider.complete("x").await {
            Err(FlowbotError::Provider { message, .. }) => assert!(message.contains("boom")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_provider_error() {
        let provider = OllamaCliProvider::new("flowbot-no-such-binary", Vec::new());
        assert!(matches!(
            provider.complete("x").await,
            Err(FlowbotError::Provider { .. })
        ));
        assert!(matches!(
            provider.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn dropped_call_does_not_hang() {
        let provider = sh("sleep 30");
        let result =
            tokio::time::timeout(Duration::from_millis(200), provider.complete("x")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn timed_out_call_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let provider = sh(&format!("sleep 1; touch '{}'", marker.display()));

        let result =
            tokio::time::timeout(Duration::from_millis(200), provider.complete("x")).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "child kept running after the call was dropped");
    }
}
