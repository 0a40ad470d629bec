//! Relay policy: the single place that decides, for every inbound event,
//! whether it is forwarded and where to.
//!
//! Handlers never await a send. Each accepted event produces exactly one
//! delivery task through [`spawn_delivery`]; everything else is dropped with
//! a [`DropReason`] that the event loop may log.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::commands::{CommandDispatcher, Invocation};
use crate::common::messages::{
    normalize_twitch_channel, ChannelScope, Platform, PlatformMessage, SubscriptionEvent,
};

use super::filter::{FilterDirection, MessageFilter};
use super::formatter;
use super::outlet::{spawn_delivery, DiscordOutlet, TwitchOutlet};

/// How many recent event ids are remembered for redelivery detection.
const RECENT_EVENT_CAPACITY: usize = 512;

/// Why an inbound event was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Authored by the relay's own Twitch account.
    SelfEcho,
    /// Authored by a Discord bot.
    BotAuthor,
    /// Posted outside the configured channel.
    OtherChannel,
    /// Same event id seen before.
    Duplicate,
    /// Nothing left to relay.
    EmptyBody,
    /// Matched a blocklist pattern.
    Filtered,
    /// Target Discord channel is not in the cache.
    ChannelUnresolved,
    /// Upstream event is missing a required field.
    Malformed,
}

/// Result of handing one inbound event to the router.
#[derive(Debug)]
pub enum RelayOutcome {
    /// A send to the other platform is in flight.
    Relayed(JoinHandle<()>),
    /// A command is running; its reply goes back to the invoking channel.
    Command(JoinHandle<()>),
    Dropped(DropReason),
}

impl RelayOutcome {
    pub fn dropped(&self) -> Option<DropReason> {
        match self {
            RelayOutcome::Dropped(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Wait for the spawned task, if any.
    #[cfg(test)]
    pub async fn settle(self) {
        if let RelayOutcome::Relayed(handle) | RelayOutcome::Command(handle) = self {
            handle.await.unwrap();
        }
    }
}

/// Bounded memory of recently processed event ids.
struct RecentEvents {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentEvents {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `key`; returns `false` if it was already present.
    fn insert(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.seen.insert(key);
        true
    }
}

/// Routes chat and subscription events between Discord and Twitch.
pub struct RelayRouter {
    discord_channel_id: u64,
    twitch_channel: String,
    filter: MessageFilter,
    discord: Arc<dyn DiscordOutlet>,
    twitch: Arc<dyn TwitchOutlet>,
    commands: Arc<CommandDispatcher>,
    recent: RecentEvents,
}

impl RelayRouter {
    pub fn new(
        discord_channel_id: u64,
        twitch_channel: &str,
        filter: MessageFilter,
        discord: Arc<dyn DiscordOutlet>,
        twitch: Arc<dyn TwitchOutlet>,
        commands: Arc<CommandDispatcher>,
    ) -> Self {
        Self {
            discord_channel_id,
            twitch_channel: normalize_twitch_channel(twitch_channel),
            filter,
            discord,
            twitch,
            commands,
            recent: RecentEvents::new(RECENT_EVENT_CAPACITY),
        }
    }

    /// Handle a Discord message.
    ///
    /// Prefixed messages are commands, whatever channel they were posted in.
    /// Anything else is relayed to Twitch only when it comes from the
    /// configured channel and a human author.
    pub fn on_discord_message(&mut self, msg: PlatformMessage) -> RelayOutcome {
        if !self.first_sighting(Platform::Discord, msg.event_id.as_deref()) {
            return RelayOutcome::Dropped(DropReason::Duplicate);
        }

        if let Some(invocation) = Invocation::parse(
            &msg.body,
            self.commands.prefix(),
            &msg.author_display_name,
        ) {
            let invocation = invocation
                .with_author_id(msg.author_id)
                .with_mentions(msg.mentions.clone());
            return self.run_command(&msg, invocation);
        }

        if msg.channel_scope != ChannelScope::Discord(self.discord_channel_id) {
            return RelayOutcome::Dropped(DropReason::OtherChannel);
        }
        if msg.is_bot {
            return RelayOutcome::Dropped(DropReason::BotAuthor);
        }
        if msg.body.trim().is_empty() {
            return RelayOutcome::Dropped(DropReason::EmptyBody);
        }

        let text = formatter::discord_to_twitch(&msg);
        if self.filter.should_filter(FilterDirection::DiscordToTwitch, &text) {
            info!("FILTERED Discord -> Twitch: {}", text);
            return RelayOutcome::Dropped(DropReason::Filtered);
        }

        let twitch = Arc::clone(&self.twitch);
        let channel = self.twitch_channel.clone();
        let outbound = text.clone();
        RelayOutcome::Relayed(spawn_delivery("discord->twitch", text, async move {
            twitch.say(&channel, &outbound).await
        }))
    }

    /// Handle a Twitch chat line.
    ///
    /// Self-echoes return before anything else, without logging.
    pub fn on_twitch_message(&mut self, msg: PlatformMessage) -> RelayOutcome {
        if msg.is_self_echo {
            return RelayOutcome::Dropped(DropReason::SelfEcho);
        }
        if !self.is_configured_twitch(&msg.channel_scope) {
            return RelayOutcome::Dropped(DropReason::OtherChannel);
        }
        if !self.first_sighting(Platform::Twitch, msg.event_id.as_deref()) {
            return RelayOutcome::Dropped(DropReason::Duplicate);
        }

        let text = formatter::twitch_to_discord(&msg);
        if self.filter.should_filter(FilterDirection::TwitchToDiscord, &text) {
            info!("FILTERED Twitch -> Discord: {}", text);
            return RelayOutcome::Dropped(DropReason::Filtered);
        }

        self.send_to_discord("twitch->discord", text)
    }

    /// `subscription` notice from the Twitch channel.
    pub fn on_twitch_subscription(
        &mut self,
        channel: &str,
        event: SubscriptionEvent,
    ) -> RelayOutcome {
        self.relay_twitch_notice(channel, event)
    }

    /// `resub` notice from the Twitch channel.
    pub fn on_twitch_resub(
        &mut self,
        channel: &str,
        event: SubscriptionEvent,
    ) -> RelayOutcome {
        self.relay_twitch_notice(channel, event)
    }

    /// `subgift` notice from the Twitch channel.
    pub fn on_twitch_subgift(
        &mut self,
        channel: &str,
        event: SubscriptionEvent,
    ) -> RelayOutcome {
        self.relay_twitch_notice(channel, event)
    }

    /// Gift sub reported by the external gifting integration.
    pub fn on_external_subgift(&mut self, event: SubscriptionEvent) -> RelayOutcome {
        self.relay_subscription("gift-webhook->discord", event)
    }

    fn relay_twitch_notice(&mut self, channel: &str, event: SubscriptionEvent) -> RelayOutcome {
        if !self.is_configured_twitch(&ChannelScope::twitch(channel)) {
            return RelayOutcome::Dropped(DropReason::OtherChannel);
        }
        self.relay_subscription("twitch-sub->discord", event)
    }

    fn relay_subscription(
        &mut self,
        route: &'static str,
        event: SubscriptionEvent,
    ) -> RelayOutcome {
        if !self.first_sighting(Platform::Twitch, event.event_id.as_deref()) {
            return RelayOutcome::Dropped(DropReason::Duplicate);
        }

        match formatter::subscription_family(&event) {
            Ok(text) => self.send_to_discord(route, text),
            Err(e) => {
                error!(route = route, error = %e, "Dropping subscription event: {:?}", event);
                RelayOutcome::Dropped(DropReason::Malformed)
            }
        }
    }

    fn send_to_discord(&self, route: &'static str, text: String) -> RelayOutcome {
        let channel_id = self.discord_channel_id;
        if !self.discord.resolve_channel(channel_id) {
            error!(
                route = route,
                channel_id, "Discord channel not found, dropping: \"{}\"", text
            );
            return RelayOutcome::Dropped(DropReason::ChannelUnresolved);
        }

        let discord = Arc::clone(&self.discord);
        let outbound = text.clone();
        RelayOutcome::Relayed(spawn_delivery(route, text, async move {
            discord.send(channel_id, &outbound).await
        }))
    }

    fn run_command(&self, msg: &PlatformMessage, invocation: Invocation) -> RelayOutcome {
        let ChannelScope::Discord(channel_id) = msg.channel_scope else {
            return RelayOutcome::Dropped(DropReason::OtherChannel);
        };
        let reply_to = msg.event_id.as_deref().and_then(|id| id.parse::<u64>().ok());
        let commands = Arc::clone(&self.commands);
        let discord = Arc::clone(&self.discord);

        RelayOutcome::Command(tokio::spawn(async move {
            let reply = commands.dispatch(&invocation).await;
            if let Err(e) = discord.reply(channel_id, reply_to, &reply).await {
                warn!(
                    command = %invocation.name,
                    error = %e,
                    "Failed to send command reply"
                );
            }
        }))
    }

    fn is_configured_twitch(&self, scope: &ChannelScope) -> bool {
        matches!(scope, ChannelScope::Twitch(channel) if *channel == self.twitch_channel)
    }

    /// Events without an id are always treated as new.
    fn first_sighting(&mut self, platform: Platform, event_id: Option<&str>) -> bool {
        match event_id {
            Some(id) => self.recent.insert(format!("{}:{}", platform, id)),
            None => true,
        }
    }
}
