//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::net::SocketAddr;

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::common::messages::normalize_twitch_channel;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.channel_id == 0 {
        errors.push("discord.channel_id must be non-zero".to_string());
    }
    if config.discord.prefix.trim().is_empty() {
        errors.push("discord.prefix must not be empty".to_string());
    }

    // Twitch
    if config.twitch.username.is_empty() {
        errors.push("twitch.username is required".to_string());
    }
    if config.twitch_token().is_empty() {
        errors.push("twitch.oauth_token is required".to_string());
    }
    let channel = normalize_twitch_channel(&config.twitch.channel);
    if channel.is_empty() {
        errors.push("twitch.channel is required".to_string());
    } else if !channel.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        errors.push(format!(
            "twitch.channel '{}' is not a valid channel login",
            config.twitch.channel
        ));
    }

    // Gift webhook
    if config.gift_webhook.enabled && config.gift_webhook.bind.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "gift_webhook.bind '{}' is not a valid socket address",
            config.gift_webhook.bind
        ));
    }

    // Filter patterns (try to compile them)
    if let Some(ref filters) = config.filters {
        let sets = [
            ("discord_to_twitch", &filters.discord_to_twitch),
            ("twitch_to_discord", &filters.twitch_to_discord),
        ];
        for (name, patterns) in sets {
            for (i, pattern) in patterns.iter().flatten().enumerate() {
                if Regex::new(pattern).is_err() {
                    errors.push(format!(
                        "filters.{}[{}] is not a valid regex: '{}'",
                        name, i, pattern
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
