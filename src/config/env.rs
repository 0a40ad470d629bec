//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `DISCORD_TOKEN` - Discord bot token
//! - `DISCORD_CHANNEL_ID` - Discord channel relayed to Twitch
//! - `DISCORD_PREFIX` - Command prefix
//! - `TWITCH_USERNAME` - Twitch bot login
//! - `TWITCH_OAUTH_TOKEN` - Twitch chat token
//! - `TWITCH_CHANNEL` - Twitch channel relayed to Discord
//! - `GIFT_WEBHOOK_ENABLED`, `GIFT_WEBHOOK_BIND`, `GIFT_WEBHOOK_SECRET`

use std::env;

use tracing::warn;

use crate::config::types::Config;

/// Environment variable naming the config file.
const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(token) = lookup("DISCORD_TOKEN") {
        config.discord.token = token;
    }
    if let Some(id) = lookup("DISCORD_CHANNEL_ID") {
        match id.trim().parse() {
            Ok(id) => config.discord.channel_id = id,
            Err(_) => warn!("Ignoring DISCORD_CHANNEL_ID '{}': not a channel id", id),
        }
    }
    if let Some(prefix) = lookup("DISCORD_PREFIX") {
        config.discord.prefix = prefix;
    }

    if let Some(username) = lookup("TWITCH_USERNAME") {
        config.twitch.username = username;
    }
    if let Some(token) = lookup("TWITCH_OAUTH_TOKEN") {
        config.twitch.oauth_token = token;
    }
    if let Some(channel) = lookup("TWITCH_CHANNEL") {
        config.twitch.channel = channel;
    }

    if let Some(enabled) = lookup("GIFT_WEBHOOK_ENABLED") {
        match enabled.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => config.gift_webhook.enabled = true,
            "0" | "false" | "no" => config.gift_webhook.enabled = false,
            other => warn!("Ignoring GIFT_WEBHOOK_ENABLED '{}'", other),
        }
    }
    if let Some(bind) = lookup("GIFT_WEBHOOK_BIND") {
        config.gift_webhook.bind = bind;
    }
    if let Some(secret) = lookup("GIFT_WEBHOOK_SECRET") {
        config.gift_webhook.secret = Some(secret);
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `RELAY_CONFIG`, otherwise returns "relay.conf".
pub fn get_config_path() -> String {
    env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "relay.conf".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_no_vars_leaves_config_unchanged() {
        let mut config = Config::default();
        config.discord.token = "original_token".to_string();

        let result = apply_overrides(config, lookup_from(&[]));
        assert_eq!(result.discord.token, "original_token");
        assert_eq!(result.discord.prefix, "!");
    }

    #[test]
    fn test_overrides_applied() {
        let result = apply_overrides(
            Config::default(),
            lookup_from(&[
                ("DISCORD_CHANNEL_ID", "987654321"),
                ("TWITCH_CHANNEL", "streamer"),
                ("TWITCH_USERNAME", "relaybot"),
                ("GIFT_WEBHOOK_ENABLED", "true"),
                ("GIFT_WEBHOOK_SECRET", "s3cret"),
            ]),
        );

        assert_eq!(result.discord.channel_id, 987654321);
        assert_eq!(result.twitch.channel, "streamer");
        assert_eq!(result.twitch.username, "relaybot");
        assert!(result.gift_webhook.enabled);
        assert_eq!(result.gift_webhook.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_bad_channel_id_ignored() {
        let mut config = Config::default();
        config.discord.channel_id = 5;

        let result = apply_overrides(config, lookup_from(&[("DISCORD_CHANNEL_ID", "general")]));
        assert_eq!(result.discord.channel_id, 5);
    }
}
