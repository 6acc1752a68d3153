use log::{info, warn};
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::*;

use crate::commands::{AppState, HandlerResult};
use crate::sessions::VoteRejection;
use crate::views;

pub async fn handle_vote_button(
    state: &AppState,
    ctx: &Context,
    component: &MessageComponentInteraction,
    poll_id: &str,
    option_id: &str,
) -> HandlerResult {
    let voter = component.user.id.0;
    info!("Recording vote: poll_id={}, option_id={}, voter={}", poll_id, option_id, voter);

    let outcome = state.sessions.lock().await.cast_public_vote(poll_id, option_id, voter);

    let reply = match outcome {
        Ok(poll) => {
            let choice = poll
                .find_option(option_id)
                .map(|option| option.text.clone())
                .unwrap_or_default();
            format!(
                "Your vote for **{}** in \"{}\" has been recorded. {} votes so far.",
                choice,
                poll.title,
                poll.total_votes()
            )
        }
        Err(VoteRejection::Poll(e)) => {
            warn!("Vote on poll {} rejected: {}", poll_id, e);
            "This poll is no longer available.".to_string()
        }
        Err(rejection) => rejection.to_string(),
    };

    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.ephemeral(true).content(views::clip(&reply, views::MESSAGE_MAX)))
        })
        .await?;
    Ok(())
}
