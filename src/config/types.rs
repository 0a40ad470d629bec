//! Configuration type definitions.

use serde::Deserialize;

/// Default Discord command prefix.
pub const DEFAULT_PREFIX: &str = "!";

/// Default bind address for the gift webhook.
pub const DEFAULT_WEBHOOK_BIND: &str = "0.0.0.0:8085";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub twitch: TwitchConfig,
    pub gift_webhook: GiftWebhookConfig,
    pub filters: Option<FiltersConfig>,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: String,
    /// The one channel relayed to and from Twitch.
    pub channel_id: u64,
    /// Prefix marking a message as a bot command.
    pub prefix: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: 0,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Twitch chat configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    /// Login name of the bot account.
    pub username: String,
    /// Chat OAuth token, with or without the `oauth:` prefix.
    pub oauth_token: String,
    /// Channel to join and relay, without the leading `#`.
    pub channel: String,
}

/// External gift-sub integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GiftWebhookConfig {
    pub enabled: bool,
    pub bind: String,
    /// Shared secret expected in the `x-relay-secret` header.
    pub secret: Option<String>,
}

impl Default for GiftWebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: DEFAULT_WEBHOOK_BIND.to_string(),
            secret: None,
        }
    }
}

/// Message filtering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Patterns blocking Discord messages from reaching Twitch.
    pub discord_to_twitch: Option<Vec<String>>,
    /// Patterns blocking Twitch messages from reaching Discord.
    pub twitch_to_discord: Option<Vec<String>>,
}

impl Config {
    /// Twitch OAuth token without the `oauth:` prefix, as twitch-irc expects it.
    pub fn twitch_token(&self) -> &str {
        self.twitch
            .oauth_token
            .strip_prefix("oauth:")
            .unwrap_or(&self.twitch.oauth_token)
    }
}
