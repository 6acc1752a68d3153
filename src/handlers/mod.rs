mod vote;

use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::prelude::*;

use crate::commands::{self, AppState, HandlerResult};

lazy_static! {
    // vote_<poll_id>_<option_id>, both ids are simple (hyphen-free) UUIDs
    static ref VOTE_ID_RE: Regex = Regex::new(r"^vote_([0-9a-f]{32})_([0-9a-f]{32})$").unwrap();
}

// Handle slash commands
pub async fn handle_command(state: &AppState, ctx: &Context, command: &ApplicationCommandInteraction) -> HandlerResult {
    info!("Received command: {} from user {}", command.data.name, command.user.id);
    match command.data.name.as_str() {
        "poll" => commands::poll::handle_poll_command(state, ctx, command).await?,
        "account" => commands::account::handle_account_command(state, ctx, command).await?,
        _ => {
            commands::send_ephemeral(ctx, command, "Unknown command").await?;
        }
    }
    Ok(())
}

/// Splits a vote button id into (poll id, option id).
fn parse_vote_custom_id(custom_id: &str) -> Option<(&str, &str)> {
    let caps = VOTE_ID_RE.captures(custom_id)?;
    let poll_id = caps.get(1)?.as_str();
    let option_id = caps.get(2)?.as_str();
    Some((poll_id, option_id))
}

pub async fn handle_component(
    state: &AppState,
    ctx: &Context,
    component: &MessageComponentInteraction,
) -> HandlerResult {
    let custom_id = &component.data.custom_id;
    info!("Received component interaction: {}", custom_id);

    match parse_vote_custom_id(custom_id) {
        Some((poll_id, option_id)) => vote::handle_vote_button(state, ctx, component, poll_id, option_id).await,
        None => {
            warn!("Unhandled component custom_id: {}", custom_id);
            component
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| message.content("Unknown button action.").ephemeral(true))
                })
                .await?;
            Ok(())
        }
    }
}

pub async fn handle_interaction(state: &AppState, ctx: &Context, interaction: Interaction) {
    let result = match interaction {
        Interaction::ApplicationCommand(command) => handle_command(state, ctx, &command).await,
        Interaction::MessageComponent(component) => handle_component(state, ctx, &component).await,
        _ => {
            warn!("Unhandled interaction type: {:?}", interaction.kind());
            Ok(())
        }
    };

    if let Err(why) = result {
        error!("Interaction handler error: {:?}", why);
    }
}
