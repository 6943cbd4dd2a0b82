// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FlowBot - a Discord productivity bot.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check_config;
mod serve;

use clap::{Parser, Subcommand};

/// FlowBot - focus timers, streaks, and a local chat relay for Discord.
#[derive(Parser, Debug)]
#[command(name = "flowbot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Discord and run the bot.
    Serve,
    /// Validate configuration and check storage and the chat command.
    CheckConfig {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match flowbot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            flowbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = flowbot_config::validate_for_serve(&config) {
                flowbot_config::render_errors(&errors);
                std::process::exit(1);
            }
            serve::run_serve(config).await
        }
        Some(Commands::CheckConfig { plain }) => {
            check_config::run_check_config(&config, plain).await
        }
        None => {
            println!("flowbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
