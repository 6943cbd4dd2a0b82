// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event handler bridging serenity events to the command router.

use async_trait::async_trait;
use flowbot_config::model::{DiscordConfig, TimerConfig};
use flowbot_core::UserId;
use flowbot_engine::{Command, CommandRouter, Invocation};
use serenity::all::{
    Command as ApplicationCommand, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, EventHandler, GuildId, Interaction,
    Member, Message, Ready,
};
use tracing::{debug, info, trace, warn};

use crate::commands;

/// Text DMed to a member after they join.
pub fn welcome_text(member: &str, guild: &str) -> String {
    format!("Welcome {member} you are now a Member of {guild}")
}

/// Name used in the chat preamble: guild nickname, then global name, then
/// username.
fn display_name(command: &CommandInteraction) -> String {
    command
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| command.user.global_name.clone())
        .unwrap_or_else(|| command.user.name.clone())
}

pub(crate) struct Handler {
    pub(crate) router: CommandRouter,
    pub(crate) config: DiscordConfig,
    pub(crate) timer: TimerConfig,
}

impl Handler {
    async fn register_commands(&self, ctx: &Context) {
        let definitions = commands::definitions(&self.timer);
        let count = definitions.len();
        match self.config.guild_id {
            Some(id) => match GuildId::new(id).set_commands(&ctx.http, definitions).await {
                Ok(_) => info!(guild_id = id, count, "registered guild commands"),
                Err(e) => warn!(guild_id = id, error = %e, "failed to register guild commands"),
            },
            None => match ApplicationCommand::set_global_commands(&ctx.http, definitions).await {
                Ok(_) => info!(count, "registered global commands"),
                Err(e) => warn!(error = %e, "failed to register global commands"),
            },
        }
    }

    async fn reply(&self, ctx: &Context, command: &CommandInteraction, content: String) {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(content),
        );
        if let Err(e) = command.create_response(&ctx.http, response).await {
            warn!(command = %command.data.name, error = %e, "failed to answer interaction");
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        let invocation = Invocation {
            user: UserId(command.user.id.get()),
            display_name: display_name(command),
            channel_id: command.guild_id.map(|_| command.channel_id.get()),
        };

        let parsed = match commands::parse_options(&command.data.name, &command.data.options) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(command = %command.data.name, error = %e, "unparseable interaction");
                self.reply(ctx, command, e.to_string()).await;
                return;
            }
        };

        match parsed {
            Command::Chat { message } => self.handle_chat(ctx, command, &invocation, &message).await,
            other => {
                let reply = self.router.dispatch(&invocation, other).await;
                self.reply(ctx, command, reply).await;
            }
        }
    }

    /// Admission is answered immediately; an admitted request defers the
    /// interaction and edits it once the model replies.
    async fn handle_chat(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        invocation: &Invocation,
        message: &str,
    ) {
        let ticket = match self.router.relay().admit(invocation.user) {
            Ok(ticket) => ticket,
            Err(rejection) => {
                self.reply(ctx, command, rejection.to_string()).await;
                return;
            }
        };

        let defer = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        if let Err(e) = command.create_response(&ctx.http, defer).await {
            warn!(user_id = %invocation.user, error = %e, "failed to defer chat interaction");
            return;
        }

        let reply = ticket.respond(&invocation.display_name, message).await;
        if let Err(e) = command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(reply))
            .await
        {
            warn!(user_id = %invocation.user, error = %e, "failed to deliver chat reply");
        }
    }

    async fn onboard(&self, ctx: &Context, member: &Member) {
        let guild_id = member.guild_id;
        let user_id = member.user.id.get();

        match guild_id.roles(&ctx.http).await {
            Ok(roles) => match roles.values().find(|r| r.name == self.config.member_role) {
                Some(role) => {
                    if let Err(e) = member.add_role(&ctx.http, role.id).await {
                        warn!(user_id, role = %role.name, error = %e, "failed to grant member role");
                    }
                }
                None => warn!(
                    guild_id = guild_id.get(),
                    role = %self.config.member_role,
                    "member role not found in guild"
                ),
            },
            Err(e) => warn!(guild_id = guild_id.get(), error = %e, "failed to list guild roles"),
        }

        let guild_name = guild_id
            .name(&ctx.cache)
            .unwrap_or_else(|| "the server".to_string());
        let text = welcome_text(&member.user.name, &guild_name);
        let delivered = match member.user.create_dm_channel(&ctx.http).await {
            Ok(dm) => dm.id.say(&ctx.http, text).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match delivered {
            Ok(()) => info!(user_id, guild = %guild_name, "welcomed new member"),
            Err(e) => warn!(user_id, error = %e, "failed to send welcome DM"),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(username = %ready.user.name, guilds = ready.guilds.len(), "discord gateway ready");
        self.register_commands(&ctx).await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let count = self.router.record_message(UserId(msg.author.id.get()));
        trace!(user_id = msg.author.id.get(), count, "counted message");
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_command(&ctx, &command).await;
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        if self.config.welcome_new_members {
            self.onboard(&ctx, &new_member).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_text_names_member_and_guild() {
        assert_eq!(
            welcome_text("ada", "Focus HQ"),
            "Welcome ada you are now a Member of Focus HQ"
        );
    }
}
