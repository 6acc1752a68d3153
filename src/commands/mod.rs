pub mod account;
pub mod poll;

use std::sync::Arc;

use serenity::builder::CreateApplicationCommands;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::*;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::sessions::SessionRegistry;
use crate::views;

pub type Sessions = Arc<Mutex<SessionRegistry>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// State every command handler needs.
pub struct AppState {
    pub sessions: Sessions,
    pub config: Arc<Config>,
}

pub fn register(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands
        .create_application_command(|command| poll::create_poll_command(command))
        .create_application_command(|command| account::create_account_command(command))
}

// Helper to read a string sub-option by name
pub(crate) fn string_option<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
}

pub(crate) async fn send_ephemeral(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    let content = views::clip(content, views::MESSAGE_MAX);
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(&content).ephemeral(true))
        })
        .await
}
