// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowbot check-config` command implementation.
//!
//! Prints the effective configuration (never the token) and checks the
//! pieces `serve` depends on: the token, the database, and the chat command.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use flowbot_config::FlowbotConfig;
use flowbot_core::{FlowbotError, HealthStatus, PluginAdapter, StorageAdapter};
use flowbot_ollama::OllamaCliProvider;
use flowbot_storage::SqliteStorage;

/// Status of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

/// Run the `flowbot check-config` command.
///
/// Returns an error when any check fails so the process exits non-zero.
pub async fn run_check_config(config: &FlowbotConfig, plain: bool) -> Result<(), FlowbotError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  flowbot check-config");
    println!("  {}", "-".repeat(50));
    for (key, value) in summary(config) {
        println!("    {key:<28} {value}");
    }
    println!();

    let results = vec![
        check_token(config),
        check_database(config).await,
        check_chat_command(config).await,
    ];

    let mut fail_count = 0;
    for result in &results {
        if result.status == CheckStatus::Fail {
            fail_count += 1;
        }
        println!("{}", render(result, use_color));
    }
    println!();

    if fail_count > 0 {
        let word = if fail_count == 1 { "check" } else { "checks" };
        println!("  {fail_count} {word} failed.");
        println!();
        return Err(FlowbotError::Config(format!("{fail_count} {word} failed")));
    }
    println!("  Configuration OK.");
    println!();
    Ok(())
}

/// Key/value lines describing the effective configuration, without secrets.
fn summary(config: &FlowbotConfig) -> Vec<(&'static str, String)> {
    vec![
        ("bot.name", config.bot.name.clone()),
        ("bot.log_level", config.bot.log_level.clone()),
        (
            "discord.token",
            if config.discord.token.is_some() { "(set)" } else { "(not set)" }.to_string(),
        ),
        (
            "discord.commands",
            match config.discord.guild_id {
                Some(id) => format!("guild {id}"),
                None => "global".to_string(),
            },
        ),
        ("discord.member_role", config.discord.member_role.clone()),
        (
            "storage.database_path",
            config
                .storage
                .database_path
                .clone()
                .unwrap_or_else(|| "(not set)".to_string()),
        ),
        (
            "timer.minutes",
            format!("{}..={}", config.timer.min_minutes, config.timer.max_minutes),
        ),
        (
            "timer.qualifying_minutes",
            config.timer.qualifying_minutes.to_string(),
        ),
        (
            "streak.reminder_hour",
            format!("{:02}:00", config.streak.reminder_hour),
        ),
        (
            "chat.command",
            std::iter::once(config.chat.command.as_str())
                .chain(config.chat.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" "),
        ),
        (
            "chat.daily_quota",
            format!(
                "{} ({} premium users)",
                config.chat.daily_quota,
                config.chat.premium_users.len()
            ),
        ),
        (
            "persistence.flush_interval",
            format!("{}s", config.persistence.flush_interval_secs),
        ),
    ]
}

fn render(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_token(config: &FlowbotConfig) -> CheckResult {
    let (status, message) = match config.discord.token.as_deref() {
        Some(token) if !token.trim().is_empty() => (CheckStatus::Pass, "token present".to_string()),
        Some(_) => (CheckStatus::Fail, "discord.token is empty".to_string()),
        None => (
            CheckStatus::Warn,
            "discord.token not set; `flowbot serve` will refuse to start".to_string(),
        ),
    };
    CheckResult {
        name: "discord token",
        status,
        message,
        duration: Duration::ZERO,
    }
}

async fn check_database(config: &FlowbotConfig) -> CheckResult {
    let start = Instant::now();
    if config.storage.database_path.is_none() {
        return CheckResult {
            name: "database",
            status: CheckStatus::Warn,
            message: "storage.database_path not set; `flowbot serve` will refuse to start"
                .to_string(),
            duration: start.elapsed(),
        };
    }
    let storage = SqliteStorage::new(config.storage.clone());

    let outcome = async {
        storage.initialize().await?;
        let snapshot = storage.load_snapshot().await?;
        let health = storage.health_check().await?;
        storage.close().await?;
        Ok::<_, FlowbotError>((snapshot.len(), health))
    }
    .await;

    let (status, message) = match outcome {
        Ok((records, HealthStatus::Healthy)) => (
            CheckStatus::Pass,
            format!(
                "{records} records at {}",
                config.storage.database_path.as_deref().unwrap_or_default()
            ),
        ),
        Ok((_, HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason))) => {
            (CheckStatus::Warn, reason)
        }
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: "database",
        status,
        message,
        duration: start.elapsed(),
    }
}

/// A missing chat command is a warning: the bot still runs and `/chat`
/// answers with a failure notice.
async fn check_chat_command(config: &FlowbotConfig) -> CheckResult {
    let start = Instant::now();
    let provider = OllamaCliProvider::from_config(&config.chat);
    let (status, message) = match provider.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, format!("`{}` runs", config.chat.command)),
        Ok(HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => {
            (CheckStatus::Warn, reason)
        }
        Err(e) => (CheckStatus::Warn, e.to_string()),
    };
    CheckResult {
        name: "chat command",
        status,
        message,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_db(dir: &tempfile::TempDir) -> FlowbotConfig {
        let mut config = FlowbotConfig::default();
        config.storage.database_path =
            Some(dir.path().join("check.db").to_string_lossy().into_owned());
        config
    }

    #[test]
    fn summary_never_prints_the_token() {
        let mut config = FlowbotConfig::default();
        config.discord.token = Some("super-secret-token".to_string());
        let lines = summary(&config);
        assert!(lines.iter().all(|(_, v)| !v.contains("super-secret-token")));
        assert!(lines.contains(&("discord.token", "(set)".to_string())));
    }

    #[test]
    fn token_check_warns_when_missing_and_fails_when_blank() {
        let mut config = FlowbotConfig::default();
        assert_eq!(check_token(&config).status, CheckStatus::Warn);

        config.discord.token = Some("  ".to_string());
        assert_eq!(check_token(&config).status, CheckStatus::Fail);

        config.discord.token = Some("abc".to_string());
        assert_eq!(check_token(&config).status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn database_check_creates_and_opens_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_db(&dir);
        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.starts_with("0 records"));
        assert!(dir.path().join("check.db").exists());
    }

    #[tokio::test]
    async fn database_check_warns_without_a_path() {
        let config = FlowbotConfig::default();
        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("storage.database_path"));
        assert!(summary(&config).contains(&("storage.database_path", "(not set)".to_string())));
    }

    #[tokio::test]
    async fn missing_chat_command_is_only_a_warning() {
        let mut config = FlowbotConfig::default();
        config.chat.command = "/definitely/not/a/real/flowbot-llm".to_string();
        let result = check_chat_command(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn plain_rendering_uses_text_tags() {
        let result = CheckResult {
            name: "database",
            status: CheckStatus::Fail,
            message: "locked".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = render(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("locked (3ms)"));
    }
}
