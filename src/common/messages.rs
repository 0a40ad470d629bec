//! Canonical event types for relay communication.
//!
//! Every inbound platform event is normalized into one of these shapes
//! before any relay decision is made. Instances live for the duration of
//! a single relay operation and are never stored.

use std::fmt;

use crate::common::error::EventError;

/// Chat platform an event originated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Discord,
    Twitch,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Discord => write!(f, "Discord"),
            Platform::Twitch => write!(f, "Twitch"),
        }
    }
}

/// Channel or room an event was posted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelScope {
    /// Discord channel snowflake.
    Discord(u64),
    /// Twitch channel login, lowercase without the leading `#`.
    Twitch(String),
}

impl ChannelScope {
    /// Build a Twitch scope, normalizing `#Channel` to `channel`.
    pub fn twitch(channel: &str) -> Self {
        ChannelScope::Twitch(normalize_twitch_channel(channel))
    }
}

/// Lowercase a Twitch channel name and strip the IRC `#` prefix.
pub fn normalize_twitch_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}

/// A Discord member referenced by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
    pub is_bot: bool,
}

/// A chat message normalized from either platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformMessage {
    pub source: Platform,
    /// Discord user tag or Twitch display name.
    pub author_display_name: String,
    /// Discord only; always false for Twitch.
    pub is_bot: bool,
    /// Twitch only; true when the relay's own account authored the message.
    pub is_self_echo: bool,
    pub body: String,
    pub channel_scope: ChannelScope,
    /// Platform message id, used to reject redelivered events.
    pub event_id: Option<String>,
    /// Discord only; the author's user id.
    pub author_id: Option<u64>,
    /// Discord only; members mentioned in the body, in order.
    pub mentions: Vec<UserRef>,
}

impl PlatformMessage {
    pub fn discord(
        author_tag: impl Into<String>,
        is_bot: bool,
        body: impl Into<String>,
        channel_id: u64,
    ) -> Self {
        Self {
            source: Platform::Discord,
            author_display_name: author_tag.into(),
            is_bot,
            is_self_echo: false,
            body: body.into(),
            channel_scope: ChannelScope::Discord(channel_id),
            event_id: None,
            author_id: None,
            mentions: Vec::new(),
        }
    }

    pub fn twitch(
        display_name: impl Into<String>,
        is_self_echo: bool,
        body: impl Into<String>,
        channel: &str,
    ) -> Self {
        Self {
            source: Platform::Twitch,
            author_display_name: display_name.into(),
            is_bot: false,
            is_self_echo,
            body: body.into(),
            channel_scope: ChannelScope::twitch(channel),
            event_id: None,
            author_id: None,
            mentions: Vec::new(),
        }
    }

    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn with_author_id(mut self, id: u64) -> Self {
        self.author_id = Some(id);
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<UserRef>) -> Self {
        self.mentions = mentions;
        self
    }
}

/// Kind of subscription notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubKind {
    NewSub,
    Resub,
    GiftSub,
}

/// A subscription-family event normalized from any source.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionEvent {
    pub username: String,
    pub cumulative_months: Option<u64>,
    pub streak_months: Option<u64>,
    pub kind: SubKind,
    /// Gift recipient; only meaningful for [`SubKind::GiftSub`].
    pub recipient: Option<String>,
    pub event_id: Option<String>,
}

impl SubscriptionEvent {
    /// Normalize a `subscription` notice, where both month counts arrive as
    /// optional tag fields (`msg-param-cumulative-months`,
    /// `msg-param-streak-months`).
    pub fn subscription(
        username: impl Into<String>,
        cumulative_months: Option<u64>,
        streak_months: Option<u64>,
    ) -> Self {
        Self {
            username: username.into(),
            cumulative_months,
            streak_months,
            kind: SubKind::NewSub,
            recipient: None,
            event_id: None,
        }
    }

    /// Normalize a `resub` notice, where the month count is a direct
    /// parameter and only the streak comes from a tag field.
    pub fn resub(username: impl Into<String>, months: u64, streak_months: Option<u64>) -> Self {
        Self {
            username: username.into(),
            cumulative_months: Some(months),
            streak_months,
            kind: SubKind::Resub,
            recipient: None,
            event_id: None,
        }
    }

    /// Normalize a gift sub. Both names are required upstream; a missing or
    /// blank one is reported instead of being relayed with a hole in it.
    pub fn gift(username: Option<&str>, recipient: Option<&str>) -> Result<Self, EventError> {
        let username = required(username, "username")?;
        let recipient = required(recipient, "recipient")?;
        Ok(Self {
            username,
            cumulative_months: None,
            streak_months: None,
            kind: SubKind::GiftSub,
            recipient: Some(recipient),
            event_id: None,
        })
    }

    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, EventError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(EventError::MissingField { field }),
    }
}
