//! The relay event loop.
//!
//! One task reads every inbound source in turn and hands each event to the
//! [`RelayRouter`]. Handlers return as soon as their send is spawned, so a
//! slow platform never holds up the next event.

use std::sync::Arc;

use serenity::all::ComponentInteraction;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use twitch_irc::message::ServerMessage;

use crate::commands::duel::DuelBoard;
use crate::common::messages::SubscriptionEvent;
use crate::discord::events::to_platform_message;
use crate::discord::{DiscordBotEvent, SerenityOutlet};
use crate::twitch::{normalize, TwitchEvent};

use super::router::{DropReason, RelayOutcome, RelayRouter};

/// Inbound event sources.
pub struct RelayInputs {
    pub discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    pub twitch_rx: mpsc::UnboundedReceiver<ServerMessage>,
    pub gift_rx: mpsc::Receiver<SubscriptionEvent>,
    pub shutdown_rx: watch::Receiver<bool>,
}

pub struct RelayLoop {
    router: RelayRouter,
    discord: Arc<SerenityOutlet>,
    duels: Arc<DuelBoard>,
    twitch_login: String,
}

impl RelayLoop {
    /// `discord` is the session holder the router's Discord outlet sends
    /// through; it is attached on Ready and detached on disconnect.
    /// `duels` must be the board the `duel` command was registered with.
    pub fn new(
        router: RelayRouter,
        discord: Arc<SerenityOutlet>,
        duels: Arc<DuelBoard>,
        twitch_login: &str,
    ) -> Self {
        Self {
            router,
            discord,
            duels,
            twitch_login: twitch_login.trim().to_lowercase(),
        }
    }

    /// Process events until shutdown or until a platform source closes.
    pub async fn run(mut self, inputs: RelayInputs) {
        let RelayInputs {
            mut discord_events_rx,
            mut twitch_rx,
            mut gift_rx,
            mut shutdown_rx,
        } = inputs;
        let mut own_user = None;
        let mut gifts_open = true;

        loop {
            tokio::select! {
                event = discord_events_rx.recv() => {
                    match event {
                        Some(DiscordBotEvent::Ready { context, ready }) => {
                            info!("Discord bot connected as {}", ready.user.name);
                            own_user = Some(ready.user.id);
                            self.discord.connect(&context);
                        }
                        Some(DiscordBotEvent::Message { message }) => {
                            if let Some(msg) = to_platform_message(&message, own_user) {
                                log_outcome(self.router.on_discord_message(msg));
                            }
                        }
                        Some(DiscordBotEvent::Component { component }) => {
                            self.handle_component(component);
                        }
                        Some(DiscordBotEvent::Disconnected) => {
                            debug!("Discord session closed");
                            self.discord.disconnect();
                        }
                        None => {
                            debug!("Discord events channel closed.");
                            break;
                        }
                    }
                }

                message = twitch_rx.recv() => {
                    match message {
                        Some(ServerMessage::Notice(notice)) => {
                            warn!("Twitch notice: {}", notice.message_text);
                        }
                        Some(message) => self.handle_twitch(message),
                        None => {
                            warn!("Twitch message channel closed");
                            break;
                        }
                    }
                }

                gift = gift_rx.recv(), if gifts_open => {
                    match gift {
                        Some(event) => log_outcome(self.router.on_external_subgift(event)),
                        None => gifts_open = false,
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping event processing");
                        break;
                    }
                }
            }
        }
    }

    fn handle_twitch(&mut self, message: ServerMessage) {
        let Some(event) = normalize(message, &self.twitch_login) else {
            return;
        };

        let outcome = match event {
            TwitchEvent::Chat(msg) => self.router.on_twitch_message(msg),
            TwitchEvent::Subscription { channel, event } => {
                self.router.on_twitch_subscription(&channel, event)
            }
            TwitchEvent::Resub { channel, event } => self.router.on_twitch_resub(&channel, event),
            TwitchEvent::SubGift { channel, event } => {
                self.router.on_twitch_subgift(&channel, event)
            }
        };
        log_outcome(outcome);
    }

    /// Button presses are answered off the loop, like command replies.
    fn handle_component(&self, component: ComponentInteraction) {
        let duels = Arc::clone(&self.duels);
        let discord = Arc::clone(&self.discord);

        tokio::spawn(async move {
            let custom_id = &component.data.custom_id;
            let Some(response) = duels.press(custom_id, component.user.id.get()).await else {
                debug!("Ignoring button {}", custom_id);
                return;
            };
            if let Err(e) = discord.respond(&component, &response).await {
                warn!(button = %custom_id, error = %e, "Failed to answer button press");
            }
        });
    }
}

fn log_outcome(outcome: RelayOutcome) {
    match outcome.dropped() {
        None | Some(DropReason::SelfEcho) => {}
        Some(reason) => debug!(?reason, "Event not relayed"),
    }
}
