mod auth;
mod commands;
mod config;
mod dashboard;
mod error;
mod handlers;
mod models;
mod sessions;
mod share;
mod store;
mod tasks;
mod views;
mod voting;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use serenity::async_trait;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::sync::Mutex;

use auth::AccountDirectory;
use commands::AppState;
use config::Config;
use sessions::SessionRegistry;
use share::RemoteQrEncoder;

struct Bot {
    state: Arc<AppState>,
    reaper_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let state = Arc::clone(&self.state);
        let ctx_clone = ctx.clone();

        // Spawn a task to handle the interaction concurrently
        tokio::spawn(async move {
            handlers::handle_interaction(&state, &ctx_clone, interaction).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let registered = Command::set_global_application_commands(&ctx.http, |builder| commands::register(builder)).await;

        if let Err(why) = registered {
            error!("Failed to register slash commands: {:?}", why);
        } else {
            info!("Successfully registered global slash commands.");
        }

        // --- Start Background Task for Idle Sessions (once) ---
        if self.reaper_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let sessions = Arc::clone(&self.state.sessions);
        let max_idle = self.state.config.session_idle;
        tokio::spawn(async move {
            tasks::session_reaper::reap_idle_sessions_task(sessions, max_idle).await;
        });
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    info!("Share links will use origin {}", config.origin);

    let registry = SessionRegistry::new(
        AccountDirectory::new(),
        config.origin.clone(),
        Arc::new(RemoteQrEncoder::new(config.qr_endpoint.clone())),
    );
    let state = Arc::new(AppState {
        sessions: Arc::new(Mutex::new(registry)),
        config: Arc::clone(&config),
    });

    // Slash commands only need the guilds intent
    let intents = GatewayIntents::GUILDS;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Bot { state, reaper_started: AtomicBool::new(false) })
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Err creating client: {:?}", e);
            return;
        }
    };

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
