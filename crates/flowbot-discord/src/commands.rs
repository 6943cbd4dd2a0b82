// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command definitions and interaction parsing.

use flowbot_config::model::TimerConfig;
use flowbot_engine::Command;
use serenity::all::{CommandDataOption, CommandOptionType, CreateCommand, CreateCommandOption};
use thiserror::Error;

const MINUTES_OPTION: &str = "minutes";
const MESSAGE_OPTION: &str = "message";

/// A slash command that could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command `/{0}`.")]
    Unknown(String),
    #[error("Missing required option `{0}`.")]
    MissingOption(&'static str),
}

/// Build the registration payload for every command.
pub fn definitions(timer: &TimerConfig) -> Vec<CreateCommand> {
    let minutes = |what: &str| {
        CreateCommandOption::new(
            CommandOptionType::Integer,
            MINUTES_OPTION,
            format!("Length of the {what} in minutes"),
        )
        .min_int_value(u64::from(timer.min_minutes))
        .max_int_value(u64::from(timer.max_minutes))
        .required(true)
    };

    vec![
        CreateCommand::new("ping").description("check bot is working"),
        CreateCommand::new("focus")
            .description("start a focus timer")
            .add_option(minutes("focus session")),
        CreateCommand::new("break")
            .description("start a break timer")
            .add_option(minutes("break")),
        CreateCommand::new("stop_focus").description("stop focus timer"),
        CreateCommand::new("stop_break").description("stop break timer"),
        CreateCommand::new("track")
            .description("check how many messages you have sent in the server"),
        CreateCommand::new("streak").description("check your daily focus streak"),
        CreateCommand::new("chat")
            .description("chat with the local assistant")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    MESSAGE_OPTION,
                    "What to ask",
                )
                .required(true),
            ),
        CreateCommand::new("quote").description("get a short motivational message"),
    ]
}

/// Turn a command name plus its option values into a [`Command`].
pub fn parse(
    name: &str,
    minutes: Option<i64>,
    message: Option<&str>,
) -> Result<Command, ParseError> {
    let minutes = || minutes.ok_or(ParseError::MissingOption(MINUTES_OPTION));
    Ok(match name {
        "ping" => Command::Ping,
        "focus" => Command::Focus {
            minutes: minutes()?,
        },
        "break" => Command::Break {
            minutes: minutes()?,
        },
        "stop_focus" => Command::StopFocus,
        "stop_break" => Command::StopBreak,
        "track" => Command::Track,
        "streak" => Command::Streak,
        "chat" => Command::Chat {
            message: message
                .ok_or(ParseError::MissingOption(MESSAGE_OPTION))?
                .to_string(),
        },
        "quote" => Command::Quote,
        other => return Err(ParseError::Unknown(other.to_string())),
    })
}

/// Parse straight from interaction options.
pub fn parse_options(name: &str, options: &[CommandDataOption]) -> Result<Command, ParseError> {
    let find = |key: &str| options.iter().find(|o| o.name == key).map(|o| &o.value);
    parse(
        name,
        find(MINUTES_OPTION).and_then(|v| v.as_i64()),
        find(MESSAGE_OPTION).and_then(|v| v.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_command_is_registered() {
        let defs = definitions(&TimerConfig::default());
        assert_eq!(defs.len(), Command::NAMES.len());
    }

    #[test]
    fn parses_commands_with_options() {
        assert_eq!(parse("ping", None, None), Ok(Command::Ping));
        assert_eq!(
            parse("focus", Some(25), None),
            Ok(Command::Focus { minutes: 25 })
        );
        assert_eq!(parse("break", Some(5), None), Ok(Command::Break { minutes: 5 }));
        assert_eq!(
            parse("chat", None, Some("hi")),
            Ok(Command::Chat {
                message: "hi".to_string()
            })
        );
    }

    #[test]
    fn every_registered_name_parses() {
        for name in Command::NAMES {
            let parsed = parse(name, Some(10), Some("x")).unwrap();
            assert_eq!(parsed.name(), name);
        }
    }

    #[test]
    fn missing_options_and_unknown_names_are_errors() {
        assert_eq!(
            parse("focus", None, None),
            Err(ParseError::MissingOption("minutes"))
        );
        assert_eq!(
            parse("chat", None, None),
            Err(ParseError::MissingOption("message"))
        );
        assert_eq!(
            parse("dance", None, None),
            Err(ParseError::Unknown("dance".to_string()))
        );
    }
}
