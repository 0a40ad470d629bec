//! Conversion of serenity messages into relay messages.

use serenity::model::channel::Message;
use serenity::model::id::UserId;

use crate::common::messages::{PlatformMessage, UserRef};

/// Normalize a gateway message. Messages written by the bot itself are
/// discarded here and never reach the router.
pub fn to_platform_message(
    message: &Message,
    own_user: Option<UserId>,
) -> Option<PlatformMessage> {
    if own_user == Some(message.author.id) {
        return None;
    }

    let urls: Vec<&str> = message.attachments.iter().map(|a| a.url.as_str()).collect();
    let body = with_attachments(message.content.trim(), &urls);
    let mentions = message
        .mentions
        .iter()
        .map(|user| UserRef {
            id: user.id.get(),
            name: user.name.clone(),
            is_bot: user.bot,
        })
        .collect();

    Some(
        PlatformMessage::discord(
            message.author.tag(),
            message.author.bot,
            body,
            message.channel_id.get(),
        )
        .with_event_id(message.id.to_string())
        .with_author_id(message.author.id.get())
        .with_mentions(mentions),
    )
}

/// Append attachment URLs to the message text, space separated.
pub fn with_attachments(content: &str, urls: &[&str]) -> String {
    let mut body = content.to_string();
    for url in urls {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(url);
    }
    body
}
