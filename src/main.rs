//! Twitchcord - Discord/Twitch chat relay
//!
//! Mirrors chat between one Discord channel and one Twitch channel, and
//! announces Twitch subscriptions and gift subs in Discord.

mod bridge;
mod commands;
mod common;
mod config;
mod discord;
mod twitch;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use bridge::{MessageFilter, RelayInputs, RelayLoop, RelayRouter};
use commands::duel::DuelBoard;
use commands::{builtin_registry, CommandDispatcher};
use config::{env::get_config_path, load_and_validate};
use discord::{DiscordBot, SerenityOutlet};
use twitch::IrcOutlet;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Twitchcord v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!(
            "Please ensure {} or the environment provides the required settings.",
            config_path
        );
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Discord channel: {}", config.discord.channel_id);
    info!("  Twitch channel: #{}", config.twitch.channel);
    info!("  Twitch account: {}", config.twitch.username);
    info!("  Command prefix: {}", config.discord.prefix);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (gift_tx, gift_rx) = mpsc::channel(64);

    // Commands
    let duels = Arc::new(DuelBoard::new());
    let registry = builtin_registry(Arc::clone(&duels))?;
    let dispatcher = Arc::new(CommandDispatcher::new(registry, config.discord.prefix.clone()));

    // Twitch
    let (twitch_rx, twitch_client) = twitch::connect(&config.twitch, config.twitch_token())?;
    let twitch_outlet = Arc::new(IrcOutlet::new(twitch_client));

    // Discord
    let (discord_bot, discord_events_rx) = DiscordBot::build(config.discord.token.clone()).await?;
    let discord_outlet = Arc::new(SerenityOutlet::new());

    let router = RelayRouter::new(
        config.discord.channel_id,
        &config.twitch.channel,
        MessageFilter::from_config(config.filters.as_ref()),
        discord_outlet.clone(),
        twitch_outlet,
        dispatcher,
    );
    let relay = RelayLoop::new(router, discord_outlet, duels, &config.twitch.username);

    // Gift webhook
    let webhook_task = if config.gift_webhook.enabled {
        let bind: SocketAddr = config.gift_webhook.bind.parse()?;
        let secret = config.gift_webhook.secret.clone();
        let shutdown_rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = webhook::serve(bind, secret, gift_tx, shutdown_rx).await {
                error!("Gift webhook failed: {}", e);
            }
        }))
    } else {
        drop(gift_tx);
        None
    };

    info!("Starting Discord bot...");
    let discord_task = tokio::spawn(discord_bot.run(shutdown_rx.clone()));

    let mut relay_task = tokio::spawn(relay.run(RelayInputs {
        discord_events_rx,
        twitch_rx,
        gift_rx,
        shutdown_rx,
    }));

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping relay...");
            true
        }
        _ = &mut relay_task => false,
    };

    if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed: {}", e);
    }

    let timeout = tokio::time::Duration::from_secs(5);
    if shutdown {
        match tokio::time::timeout(timeout, relay_task).await {
            Ok(Ok(())) => info!("Relay loop stopped"),
            Ok(Err(e)) => warn!("Relay task panicked: {}", e),
            Err(_) => warn!("Relay loop stop timed out"),
        }
    }
    match tokio::time::timeout(timeout, discord_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Discord task panicked: {}", e),
        Err(_) => warn!("Discord shutdown timed out"),
    }
    if let Some(task) = webhook_task {
        if tokio::time::timeout(timeout, task).await.is_err() {
            warn!("Gift webhook shutdown timed out");
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
