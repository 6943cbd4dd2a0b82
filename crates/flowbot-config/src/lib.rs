// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for FlowBot.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use flowbot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Bot name: {}", config.bot.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FlowbotConfig;
pub use validation::validate_for_serve;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted into miette diagnostics carrying source
/// spans and typo suggestions.
pub fn load_and_validate() -> Result<FlowbotConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<FlowbotConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every existing config file so diagnostics can show source spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_file_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = if path.is_relative() {
                std::env::current_dir()
                    .map(|dir| dir.join(&path))
                    .unwrap_or_else(|_| path.clone())
            } else {
                path
            };
            Some((display.display().to_string(), content))
        })
        .collect()
}
