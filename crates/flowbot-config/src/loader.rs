// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowbot.toml` > `~/.config/flowbot/flowbot.toml` > `/etc/flowbot/flowbot.toml`
//! with environment variable overrides via the `FLOWBOT_` prefix and the two
//! legacy deployment variables `API_KEY` and `DATABASE_URL`.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FlowbotConfig;

/// Config sections that `FLOWBOT_<SECTION>_<KEY>` variables may address.
const ENV_SECTIONS: &[&str] = &[
    "bot",
    "discord",
    "storage",
    "timer",
    "streak",
    "chat",
    "persistence",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowbot/flowbot.toml` (system-wide)
/// 3. `~/.config/flowbot/flowbot.toml` (user XDG config)
/// 4. `./flowbot.toml` (local directory)
/// 5. `API_KEY` / `DATABASE_URL`
/// 6. `FLOWBOT_*` environment variables
pub fn load_config() -> Result<FlowbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FlowbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlowbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowbotConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(FlowbotConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(legacy_env_provider()).merge(env_provider())
}

/// Candidate config files, lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/flowbot/flowbot.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("flowbot/flowbot.toml"));
    }
    paths.push(PathBuf::from("flowbot.toml"));
    paths
}

/// Map `FLOWBOT_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `FLOWBOT_CHAT_TIMEOUT_SECS` must become
/// `chat.timeout_secs`, not `chat.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("FLOWBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// The original deployment configured the bot through `API_KEY` and
/// `DATABASE_URL`; keep honoring them.
fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&["API_KEY", "DATABASE_URL"])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "api_key" => "discord.token".into(),
            _ => "storage.database_path".into(),
        })
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(&format!("{section}_")) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("chat_timeout_secs"), "chat.timeout_secs");
        assert_eq!(map_env_key("DISCORD_TOKEN"), "discord.token");
        assert_eq!(
            map_env_key("persistence_flush_interval_secs"),
            "persistence.flush_interval_secs"
        );
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn config_paths_end_with_local_file() {
        let paths = config_file_paths();
        assert_eq!(paths.first().unwrap(), Path::new("/etc/flowbot/flowbot.toml"));
        assert_eq!(paths.last().unwrap(), Path::new("flowbot.toml"));
    }
}
