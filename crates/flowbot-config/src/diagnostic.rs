// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Turns Figment extraction errors into miette diagnostics that point at the
//! offending key in the TOML source and suggest the closest valid key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(flowbot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same section.
        valid_keys: String,
        #[label("not a FlowBot setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(flowbot::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(flowbot::config::missing_key),
        help("set `{key}` in flowbot.toml or through its FLOWBOT_ environment variable")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(flowbot::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(flowbot::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
///
/// `toml_sources` holds `(path, content)` pairs used to locate spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                let (span, src) = locate(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid),
                    valid_keys: valid.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error
                    .path
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Find the span of `field` in whichever TOML file produced `error`.
fn locate(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file path; fall back to the only source given.
    let source = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, content)) = source else {
        return (None, None);
    };
    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the `[path[0]]` table (or the document root).
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            // Next table reached without finding the key.
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match for `unknown` above the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["timeout_secs", "daily_quota", "premium_users"];
        assert_eq!(
            suggest_key("timout_secs", valid),
            Some("timeout_secs".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["name", "log_level"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn finds_key_inside_its_section() {
        let content = "[bot]\nname = \"x\"\n\n[chat]\ndaly_quota = 5\n";
        let path = vec!["chat".to_string()];
        let offset = find_key_offset(content, &path, "daly_quota").unwrap();
        assert_eq!(&content[offset..offset + 10], "daly_quota");
    }

    #[test]
    fn does_not_match_key_from_later_section() {
        let content = "[bot]\nname = \"x\"\n[chat]\nnaem = 1\n";
        let path = vec!["bot".to_string()];
        assert_eq!(find_key_offset(content, &path, "naem"), None);
    }

    #[test]
    fn does_not_match_key_prefix() {
        let content = "[chat]\ntimeout_secs_extra = 1\n";
        let path = vec!["chat".to_string()];
        assert_eq!(find_key_offset(content, &path, "timeout_secs"), None);
    }
}
