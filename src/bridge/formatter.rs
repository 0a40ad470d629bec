//! Message formatting for the opposite platform.
//!
//! Pure functions: the same event always yields byte-identical text.

use crate::common::error::EventError;
use crate::common::messages::{PlatformMessage, SubKind, SubscriptionEvent};

/// Render a Discord message for Twitch chat.
pub fn discord_to_twitch(msg: &PlatformMessage) -> String {
    format!("~Discord~ {}: {}", msg.author_display_name, msg.body)
}

/// Render a Twitch chat message for Discord.
pub fn twitch_to_discord(msg: &PlatformMessage) -> String {
    format!("`{}` **(Twitch):** {}", msg.author_display_name, msg.body)
}

/// Render a new-sub or resub notice.
///
/// Absent or zero cumulative months select the "new subscriber" text;
/// any other count selects the re-sub text, whatever the event kind was.
pub fn subscription(event: &SubscriptionEvent) -> String {
    match event.cumulative_months {
        None | Some(0) => format!(
            "🎉 A new subscriber! __`{}`__ just subscribed to the channel!",
            event.username
        ),
        Some(months) => {
            let mut text = format!(
                "✨ Re-sub from __`{}`__! This is their {} month in a row!",
                event.username, months
            );
            if let Some(streak) = event.streak_months.filter(|s| *s > 0) {
                text.push_str(&format!(" (Streak: {} months)", streak));
            }
            text
        }
    }
}

/// Render a gift sub, shared by the native Twitch event and the external
/// gifting integration.
pub fn gift(event: &SubscriptionEvent) -> Result<String, EventError> {
    let recipient = event
        .recipient
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or(EventError::MissingField { field: "recipient" })?;
    if event.username.is_empty() {
        return Err(EventError::MissingField { field: "username" });
    }

    Ok(format!(
        "🎁 __`{}`__ just gifted a sub to __`{}`__!",
        event.username, recipient
    ))
}

/// Render any subscription-family event.
pub fn subscription_family(event: &SubscriptionEvent) -> Result<String, EventError> {
    match event.kind {
        SubKind::NewSub | SubKind::Resub => Ok(subscription(event)),
        SubKind::GiftSub => gift(event),
    }
}
