//! Discord gateway client.
//!
//! Builds the serenity client, forwards gateway events into the relay loop
//! and keeps the connection alive until shutdown.

use std::time::Duration;

use backon::BackoffBuilder;
use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::application::{ComponentInteraction, Interaction};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { context: Context, ready: Ready },
    /// Message received.
    Message { message: Message },
    /// Message button pressed.
    Component { component: ComponentInteraction },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready { context, ready });
    }

    async fn message(&self, _context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message { message });
    }

    async fn interaction_create(&self, _context: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            self.forward(DiscordBotEvent::Component { component });
        }
    }
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// Exponential backoff for gateway reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_RECONNECT_DELAY)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(300);

/// Owns the gateway connection.
pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBot {
    /// Build the client. Gateway events arrive on the returned receiver.
    pub async fn build(
        token: String,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<DiscordBotEvent>)> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel();
        let client = build_client(&token, discord_events_tx.clone()).await?;

        Ok((
            Self {
                client: Some(client),
                token,
                discord_events_tx,
            },
            discord_events_rx,
        ))
    }

    /// Keep the gateway connected until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());

        tokio::select! {
            _ = Self::run_connection(&mut self.client, &self.token, &self.discord_events_tx) => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => match build_client(token, discord_events_tx.clone()).await {
                    Ok(client) => {
                        backoff = discord_backoff();
                        client
                    }
                    Err(e) => {
                        error!("Failed to rebuild Discord client: {}", e);
                        let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                        warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                        sleep(delay).await;
                        continue;
                    }
                },
            };

            let result = client.start().await;
            if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                warn!("Failed to process discord event: {}", error);
            }

            match result {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_bounded() {
        let delays: Vec<Duration> = discord_backoff().take(50).collect();
        assert_eq!(delays.len(), 50);
        assert!(delays.iter().all(|d| *d <= MAX_RECONNECT_DELAY * 2));
        assert!(delays[0] >= Duration::from_secs(5));
    }
}
