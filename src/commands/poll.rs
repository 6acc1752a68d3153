use log::{error, info, warn};
use serenity::builder::{CreateApplicationCommand, CreateComponents, CreateEmbed};
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::*;

use super::{send_ephemeral, string_option, AppState, HandlerResult};
use crate::dashboard::{Dashboard, DialogView, Notification, ResultsView, ShareView};
use crate::models::Poll;
use crate::views::{self, Card};

const BUTTON_LABEL_MAX: usize = 80;
// Discord messages cap at 2000 characters, leave room for the code fence
const EXPORT_MAX_LEN: usize = 1980;
const CLOSED_POLL: &str = "This poll is closed. Reopen it with `/poll close` before sharing.";
const SIGN_IN_FIRST: &str = "Sign in to access your polls and dashboard: `/account signin` or `/account signup`.";

pub fn create_poll_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("poll")
        .description("Create, share and manage polls")
        .create_option(|option| {
            option
                .name("create")
                .description("Create a new poll")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("title")
                        .description("The poll question")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("options")
                        .description("Comma-separated list of 2 to 6 options")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("description")
                        .description("Optional details about the poll")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
        })
        .create_option(|option| {
            option
                .name("list")
                .description("List your polls, newest first")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("stats")
                .description("Totals across all your polls")
                .kind(CommandOptionType::SubCommand)
        });

    for (name, description, id_required) in [
        ("results", "View the results of a poll (defaults to the last one viewed)", false),
        ("share", "Post a poll to this channel with its link and QR code", true),
        ("copy", "Get a poll's link just for you", true),
        ("export", "Download a poll and its results as JSON", true),
        ("close", "Close an active poll, or reopen a closed one", true),
        ("delete", "Delete a poll permanently", true),
    ] {
        command.create_option(|option| {
            option
                .name(name)
                .description(description)
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("poll_id")
                        .description("ID of the poll")
                        .kind(CommandOptionType::String)
                        .required(id_required)
                })
        });
    }
    command
}

pub async fn handle_poll_command(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> HandlerResult {
    // Get the subcommand
    let Some(subcommand) = command.data.options.first() else {
        send_ephemeral(ctx, command, "No subcommand provided").await?;
        return Ok(());
    };
    let args = &subcommand.options;
    let poll_id = string_option(args, "poll_id").unwrap_or_default().trim();

    match subcommand.name.as_str() {
        "create" => {
            let title = string_option(args, "title").unwrap_or_default();
            let description = string_option(args, "description");
            let options: Vec<String> = string_option(args, "options")
                .unwrap_or_default()
                .split(',')
                .map(str::to_string)
                .collect();
            handle_create_poll(state, ctx, command, title, description, &options).await
        }
        "list" => handle_list_polls(state, ctx, command).await,
        "stats" => handle_stats(state, ctx, command).await,
        "results" => handle_results(state, ctx, command, poll_id).await,
        "share" => handle_share(state, ctx, command, poll_id).await,
        "copy" => handle_copy_link(state, ctx, command, poll_id).await,
        "export" => handle_export(state, ctx, command, poll_id).await,
        "close" => handle_toggle_poll(state, ctx, command, poll_id).await,
        "delete" => handle_delete_poll(state, ctx, command, poll_id).await,
        _ => {
            send_ephemeral(ctx, command, "Unknown subcommand").await?;
            Ok(())
        }
    }
}

fn toast_text(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(|n| {
            if n.destructive {
                format!("⚠️ **{}** {}", n.title, n.description)
            } else {
                format!("✅ **{}** {}", n.title, n.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn handle_create_poll(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    title: &str,
    description: Option<&str>,
    options: &[String],
) -> HandlerResult {
    let reply = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            Some(dashboard) => {
                let created = dashboard.create_poll(title, description, options);
                let mut reply = toast_text(&dashboard.drain_notifications());
                if let Ok(poll) = created {
                    reply.push_str(&format!(
                        "\n**{}** is live with {} options.\nID: `{}`\nUse `/poll share poll_id:{}` to post it here.",
                        poll.title,
                        poll.options.len(),
                        poll.id,
                        poll.id
                    ));
                }
                reply
            }
            None => SIGN_IN_FIRST.to_string(),
        }
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_list_polls(state: &AppState, ctx: &Context, command: &ApplicationCommandInteraction) -> HandlerResult {
    let reply = match state.sessions.lock().await.dashboard_mut(command.user.id.0) {
        Some(dashboard) => views::poll_list(dashboard.polls()),
        None => SIGN_IN_FIRST.to_string(),
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_stats(state: &AppState, ctx: &Context, command: &ApplicationCommandInteraction) -> HandlerResult {
    let reply = match state.sessions.lock().await.dashboard_mut(command.user.id.0) {
        Some(dashboard) => views::stats(&dashboard.stats()),
        None => SIGN_IN_FIRST.to_string(),
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_results(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let outcome: Result<ResultsView, String> = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            // Without an id, re-render the results dialog that is already open
            Some(dashboard) if poll_id.is_empty() => match dashboard.current_view() {
                Some(DialogView::Results(view)) => Ok(view),
                _ => Err("No results are open. Pass a `poll_id`.".to_string()),
            },
            Some(dashboard) => {
                let view = dashboard.view_results(poll_id);
                let toasts = toast_text(&dashboard.drain_notifications());
                view.map_err(|_| toasts)
            }
            None => Err(SIGN_IN_FIRST.to_string()),
        }
    };

    let view = match outcome {
        Ok(view) => view,
        Err(reply) => {
            send_ephemeral(ctx, command, &reply).await?;
            return Ok(());
        }
    };

    let card = views::results_card(&view);
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.ephemeral(true).embed(|embed| apply_card(embed, &card)))
        })
        .await?;
    Ok(())
}

fn apply_card<'a>(embed: &'a mut CreateEmbed, card: &Card) -> &'a mut CreateEmbed {
    embed.title(&card.title);
    if let Some(url) = &card.url {
        embed.url(url);
    }
    if let Some(description) = &card.description {
        embed.description(description);
    }
    for (name, value, inline) in &card.fields {
        embed.field(name, value, *inline);
    }
    embed.footer(|footer| footer.text(&card.footer))
}

/// Lays out one vote button per option plus the link buttons.
fn share_components<'a>(
    components: &'a mut CreateComponents,
    poll: &Poll,
    view: &ShareView,
) -> &'a mut CreateComponents {
    for chunk in poll.options.chunks(3) {
        components.create_action_row(|row| {
            for option in chunk {
                row.create_button(|btn| {
                    btn.custom_id(format!("vote_{}_{}", poll.id, option.id))
                        .label(views::clip(&option.text, BUTTON_LABEL_MAX))
                        .style(ButtonStyle::Primary)
                });
            }
            row
        });
    }
    components.create_action_row(|row| {
        row.create_button(|btn| btn.label("Open poll").style(ButtonStyle::Link).url(&view.target.url));
        if let Some(qr) = &view.qr {
            row.create_button(|btn| btn.label("Download QR").style(ButtonStyle::Link).url(&qr.url));
        }
        row
    })
}

async fn handle_share(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let outcome: Result<(Poll, ShareView), String> = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            Some(dashboard) => prepare_share(dashboard, poll_id),
            None => Err(SIGN_IN_FIRST.to_string()),
        }
    };
    let (poll, view) = match outcome {
        Ok(found) => found,
        Err(reply) => {
            send_ephemeral(ctx, command, &reply).await?;
            return Ok(());
        }
    };

    // Post publicly first; if that fails fall back to the copy-link path.
    let card = views::share_card(&poll, &view);
    let posted = command
        .channel_id
        .send_message(&ctx.http, |message| {
            message
                .embed(|embed| {
                    apply_card(embed, &card);
                    if let Some(qr) = &view.qr {
                        embed.image(&qr.url);
                    }
                    embed
                })
                .components(|components| share_components(components, &poll, &view))
        })
        .await;

    match posted {
        Ok(message) => {
            info!("Shared poll {} as message {}", poll.id, message.id);
            send_ephemeral(ctx, command, "Poll shared! Anyone in this channel can now vote.").await?;
        }
        Err(e) => {
            warn!("Could not post poll {} to channel {}: {:?}", poll.id, command.channel_id, e);
            send_ephemeral(ctx, command, &copy_link_text(&view)).await?;
        }
    }
    Ok(())
}

/// Resolves a poll for public sharing. Closed polls are refused before any
/// share dialog is opened.
fn prepare_share(dashboard: &mut Dashboard, poll_id: &str) -> Result<(Poll, ShareView), String> {
    if let Some(poll) = dashboard.store().get(poll_id) {
        if !poll.is_active {
            return Err(CLOSED_POLL.to_string());
        }
    }
    match dashboard.share(poll_id) {
        Ok(view) => dashboard
            .store()
            .get(&view.poll_id)
            .cloned()
            .map(|poll| (poll, view))
            .ok_or_else(|| "Poll not found".to_string()),
        Err(_) => Err(toast_text(&dashboard.drain_notifications())),
    }
}

fn copy_link_text(view: &ShareView) -> String {
    let mut text = format!("**Link copied!** Share this link to collect votes:\n{}", view.target.url);
    if let Some(qr) = &view.qr {
        text.push_str(&format!("\nQR code ({}, {}x{}): {}", view.qr_file_name, qr.width, qr.width, qr.url));
    }
    text
}

async fn handle_copy_link(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let reply = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            Some(dashboard) => match dashboard.share(poll_id) {
                Ok(view) => copy_link_text(&view),
                Err(_) => toast_text(&dashboard.drain_notifications()),
            },
            None => SIGN_IN_FIRST.to_string(),
        }
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_export(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let reply = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            Some(dashboard) => match dashboard.view_results(poll_id) {
                Ok(view) => match views::export_json(&view) {
                    Ok(json) if json.len() <= EXPORT_MAX_LEN => format!("```json\n{}\n```", json),
                    Ok(_) => view.results.summary.clone(),
                    Err(e) => {
                        error!("Failed to serialize poll {}: {}", poll_id, e);
                        "Could not export this poll.".to_string()
                    }
                },
                Err(_) => toast_text(&dashboard.drain_notifications()),
            },
            None => SIGN_IN_FIRST.to_string(),
        }
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_toggle_poll(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let reply = {
        let mut sessions = state.sessions.lock().await;
        match sessions.dashboard_mut(command.user.id.0) {
            Some(dashboard) => {
                if let Err(e) = dashboard.toggle_poll(poll_id) {
                    error!("Failed to toggle poll {}: {}", poll_id, e);
                }
                toast_text(&dashboard.drain_notifications())
            }
            None => SIGN_IN_FIRST.to_string(),
        }
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_delete_poll(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> HandlerResult {
    let reply = {
        let user = command.user.id.0;
        let mut sessions = state.sessions.lock().await;
        match sessions.delete_poll(user, poll_id) {
            Some(true) => sessions
                .dashboard_mut(user)
                .map(|dashboard| toast_text(&dashboard.drain_notifications()))
                .unwrap_or_default(),
            Some(false) => format!("No poll with ID `{}`.", poll_id),
            None => SIGN_IN_FIRST.to_string(),
        }
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::auth::Session;
    use crate::share::{QrImage, RemoteQrEncoder, ShareTarget};

    #[test]
    fn toasts_are_flagged_by_kind() {
        let notes = vec![
            Notification { title: "Poll created!".into(), description: "Live.".into(), destructive: false },
            Notification { title: "Invalid poll".into(), description: "Too few.".into(), destructive: true },
        ];
        assert_eq!(toast_text(&notes), "✅ **Poll created!** Live.\n⚠️ **Invalid poll** Too few.");
    }

    fn dashboard() -> Dashboard {
        let session = Session {
            user_id: "u1".into(),
            email: "u1@example.com".into(),
            display_name: "User One".into(),
            signed_in_at: Utc::now(),
        };
        Dashboard::new(session, "https://pollshare.app", Arc::new(RemoteQrEncoder::new("https://qr.example/create")))
    }

    #[test]
    fn closed_polls_are_refused_before_sharing() {
        let mut dash = dashboard();
        let poll = dash.create_poll("Lunch?", None, &["Pizza".to_string(), "Salad".to_string()]).unwrap();
        dash.toggle_poll(&poll.id).unwrap();
        dash.drain_notifications();

        assert_eq!(prepare_share(&mut dash, &poll.id), Err(CLOSED_POLL.to_string()));
        assert!(dash.current_view().is_none());

        dash.toggle_poll(&poll.id).unwrap();
        let (shared, view) = prepare_share(&mut dash, &poll.id).unwrap();
        assert_eq!(shared.id, poll.id);
        assert!(matches!(dash.current_view(), Some(DialogView::Share(open)) if open == view));
    }

    #[test]
    fn sharing_a_missing_poll_reports_it() {
        let mut dash = dashboard();
        let reply = prepare_share(&mut dash, "missing").unwrap_err();
        assert!(reply.contains("Poll not found"));
    }

    #[test]
    fn copy_text_includes_link_and_qr() {
        let view = ShareView {
            poll_id: "abc".into(),
            target: ShareTarget {
                title: "Lunch?".into(),
                text: "Vote on this poll: Lunch?".into(),
                url: "https://pollshare.app/poll/abc".into(),
            },
            qr: Some(QrImage { url: "https://qr.example/x".into(), width: 200 }),
            qr_file_name: "poll-abc-qr.png".into(),
        };
        let text = copy_link_text(&view);
        assert!(text.contains("https://pollshare.app/poll/abc"));
        assert!(text.contains("QR code (poll-abc-qr.png, 200x200): https://qr.example/x"));
    }
}
