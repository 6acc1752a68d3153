use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::*;

use super::{send_ephemeral, string_option, AppState, HandlerResult};
use crate::sessions::SessionRegistry;

pub fn create_account_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("account")
        .description("Sign in to manage your polls")
        .create_option(|option| {
            option
                .name("signup")
                .description("Create your PollShare account")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub| {
                    sub.name("email").description("Email address").kind(CommandOptionType::String).required(true)
                })
                .create_sub_option(|sub| {
                    sub.name("password").description("At least 6 characters").kind(CommandOptionType::String).required(true)
                })
                .create_sub_option(|sub| {
                    sub.name("name").description("Full name").kind(CommandOptionType::String).required(true)
                })
        })
        .create_option(|option| {
            option
                .name("signin")
                .description("Sign in to access your polls and dashboard")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub| {
                    sub.name("email").description("Email address").kind(CommandOptionType::String).required(true)
                })
                .create_sub_option(|sub| {
                    sub.name("password").description("Password").kind(CommandOptionType::String).required(true)
                })
        })
        .create_option(|option| {
            option
                .name("signout")
                .description("Sign out and discard this session's polls")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("whoami")
                .description("Show who you are signed in as")
                .kind(CommandOptionType::SubCommand)
        })
}

pub async fn handle_account_command(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> HandlerResult {
    let Some(subcommand) = command.data.options.first() else {
        send_ephemeral(ctx, command, "No subcommand provided").await?;
        return Ok(());
    };
    let user = command.user.id.0;
    let args = &subcommand.options;

    let reply = match subcommand.name.as_str() {
        "signup" => {
            let email = string_option(args, "email").unwrap_or_default();
            let password = string_option(args, "password").unwrap_or_default();
            let name = string_option(args, "name").unwrap_or_default();
            let result = SessionRegistry::sign_up(&state.sessions, user, email, password, name).await;
            match result {
                Ok(session) => format!(
                    "**Account created!** Welcome, {}. Your account has been created successfully.",
                    session.display_name
                ),
                Err(e) => format!("**Authentication failed:** {}", e),
            }
        }
        "signin" => {
            let email = string_option(args, "email").unwrap_or_default();
            let password = string_option(args, "password").unwrap_or_default();
            let result = SessionRegistry::sign_in(&state.sessions, user, email, password).await;
            match result {
                Ok(session) => format!(
                    "**Welcome back, {}!** You have successfully signed in.",
                    session.display_name
                ),
                Err(e) => format!("**Authentication failed:** {}", e),
            }
        }
        "signout" => {
            if SessionRegistry::sign_out(&state.sessions, user).await {
                info!("User {} signed out via command", user);
                "You have been signed out.".to_string()
            } else {
                "You are not signed in.".to_string()
            }
        }
        "whoami" => match state.sessions.lock().await.whoami(user) {
            Some(session) => format!(
                "Signed in as **{}** ({}) since {}",
                session.display_name,
                session.email,
                session.signed_in_at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => "You are not signed in. Use `/account signin` or `/account signup`.".to_string(),
        },
        _ => "Unknown subcommand".to_string(),
    };

    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}
