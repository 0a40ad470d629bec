//! Message filtering with regex patterns.
//!
//! Blocks relayed chat lines that match operator-configured patterns,
//! independently for each relay direction.

use fancy_regex::Regex;
use tracing::warn;

use crate::config::types::FiltersConfig;

/// Direction of message flow for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDirection {
    DiscordToTwitch,
    TwitchToDiscord,
}

/// Message filter that checks messages against regex patterns.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    discord_to_twitch: Vec<CompiledPattern>,
    twitch_to_discord: Vec<CompiledPattern>,
}

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug, Clone)]
struct CompiledPattern {
    original: String,
    regex: Regex,
}

impl MessageFilter {
    /// Build from pattern lists. Invalid patterns are logged and skipped.
    pub fn new(
        discord_to_twitch: Option<Vec<String>>,
        twitch_to_discord: Option<Vec<String>>,
    ) -> Self {
        Self {
            discord_to_twitch: compile_patterns(discord_to_twitch.unwrap_or_default()),
            twitch_to_discord: compile_patterns(twitch_to_discord.unwrap_or_default()),
        }
    }

    pub fn from_config(config: Option<&FiltersConfig>) -> Self {
        match config {
            Some(filters) => Self::new(
                filters.discord_to_twitch.clone(),
                filters.twitch_to_discord.clone(),
            ),
            None => Self::default(),
        }
    }

    /// Returns `true` if the message matches a pattern and must not be relayed.
    pub fn should_filter(&self, direction: FilterDirection, message: &str) -> bool {
        let patterns = match direction {
            FilterDirection::DiscordToTwitch => &self.discord_to_twitch,
            FilterDirection::TwitchToDiscord => &self.twitch_to_discord,
        };

        patterns.iter().any(|p| {
            p.regex.is_match(message).unwrap_or_else(|e| {
                warn!("Regex match error for pattern '{}': {}", p.original, e);
                false
            })
        })
    }
}

fn compile_patterns(patterns: Vec<String>) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledPattern {
                original: pattern,
                regex,
            }),
            Err(e) => {
                warn!("Invalid filter regex pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_all() {
        let filter = MessageFilter::default();
        assert!(!filter.should_filter(FilterDirection::DiscordToTwitch, "anything"));
        assert!(!filter.should_filter(FilterDirection::TwitchToDiscord, "anything"));
    }

    #[test]
    fn test_directions_are_independent() {
        let filter = MessageFilter::new(None, Some(vec!["blocked".to_string()]));
        assert!(!filter.should_filter(FilterDirection::DiscordToTwitch, "blocked"));
        assert!(filter.should_filter(FilterDirection::TwitchToDiscord, "blocked"));
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let filter = MessageFilter::new(
            Some(vec!["[invalid".to_string(), "(?i)buy followers".to_string()]),
            None,
        );
        assert!(filter.should_filter(FilterDirection::DiscordToTwitch, "BUY FOLLOWERS now"));
        assert!(!filter.should_filter(FilterDirection::DiscordToTwitch, "hello"));
    }

    #[test]
    fn test_lookahead_supported() {
        let pattern = r"https?://(?!clips\.twitch\.tv)".to_string();
        let filter = MessageFilter::new(Some(vec![pattern]), None);
        let direction = FilterDirection::DiscordToTwitch;
        assert!(filter.should_filter(direction, "see https://scam.example"));
        assert!(!filter.should_filter(direction, "https://clips.twitch.tv/abc"));
    }
}
