//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
#[cfg(test)]
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc"
                channel_id = 1234
                prefix = "?"
            }
            twitch {
                username = "relaybot"
                oauth_token = "oauth:xyz"
                channel = "streamer"
            }
            gift_webhook {
                enabled = true
                secret = "hunter2"
            }
            filters {
                discord_to_twitch = ["spam"]
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.channel_id, 1234);
        assert_eq!(config.discord.prefix, "?");
        assert_eq!(config.twitch.channel, "streamer");
        assert_eq!(config.twitch_token(), "xyz");
        assert!(config.gift_webhook.enabled);
        assert_eq!(config.gift_webhook.bind, "0.0.0.0:8085");
        let filters = config.filters.unwrap();
        assert_eq!(filters.discord_to_twitch, Some(vec!["spam".to_string()]));
        assert_eq!(filters.twitch_to_discord, None);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = load_config_str(r#"twitch { channel = "streamer" }"#).unwrap();
        assert_eq!(config.discord.prefix, "!");
        assert_eq!(config.discord.channel_id, 0);
        assert!(!config.gift_webhook.enabled);
    }
}
