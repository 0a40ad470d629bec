//! Normalization of Twitch IRC messages into relay events.
//!
//! `PRIVMSG` becomes a chat [`PlatformMessage`]; the subscription family of
//! `USERNOTICE`s becomes a [`SubscriptionEvent`]. Everything else is not
//! relayed.

use tracing::error;
use twitch_irc::message::{ServerMessage, UserNoticeEvent};

use crate::common::messages::{PlatformMessage, SubscriptionEvent};

/// A relay-relevant Twitch event.
#[derive(Debug, Clone, PartialEq)]
pub enum TwitchEvent {
    Chat(PlatformMessage),
    Subscription { channel: String, event: SubscriptionEvent },
    Resub { channel: String, event: SubscriptionEvent },
    SubGift { channel: String, event: SubscriptionEvent },
}

/// Convert an IRC message. `bot_login` identifies the relay's own account.
pub fn normalize(message: ServerMessage, bot_login: &str) -> Option<TwitchEvent> {
    match message {
        ServerMessage::Privmsg(msg) => Some(TwitchEvent::Chat(chat_message(
            &msg.channel_login,
            &msg.sender.login,
            &msg.sender.name,
            &msg.message_text,
            &msg.message_id,
            bot_login,
        ))),
        ServerMessage::UserNotice(notice) => {
            let channel = notice.channel_login;
            let username = notice.sender.name;
            let event_id = notice.message_id;

            match notice.event {
                UserNoticeEvent::SubOrResub {
                    is_resub: true,
                    cumulative_months,
                    streak_months,
                    ..
                } => Some(TwitchEvent::Resub {
                    channel,
                    event: SubscriptionEvent::resub(username, cumulative_months, streak_months)
                        .with_event_id(event_id),
                }),
                UserNoticeEvent::SubOrResub {
                    cumulative_months,
                    streak_months,
                    ..
                } => Some(TwitchEvent::Subscription {
                    channel,
                    event: SubscriptionEvent::subscription(
                        username,
                        Some(cumulative_months),
                        streak_months,
                    )
                    .with_event_id(event_id),
                }),
                UserNoticeEvent::SubGift { recipient, .. } => {
                    match SubscriptionEvent::gift(Some(&username), Some(&recipient.name)) {
                        Ok(event) => Some(TwitchEvent::SubGift {
                            channel,
                            event: event.with_event_id(event_id),
                        }),
                        Err(e) => {
                            error!(
                                error = %e,
                                "Dropping malformed Twitch gift sub in #{}", channel
                            );
                            None
                        }
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Build a chat message; the sender is a self-echo when its login matches
/// the relay's own login.
pub fn chat_message(
    channel: &str,
    sender_login: &str,
    sender_name: &str,
    text: &str,
    message_id: &str,
    bot_login: &str,
) -> PlatformMessage {
    let is_self_echo = sender_login.eq_ignore_ascii_case(bot_login.trim());
    PlatformMessage::twitch(sender_name, is_self_echo, text, channel).with_event_id(message_id)
}

/// Raw IRC lines as Twitch sends them, for tests that drive the relay from
/// the wire.
#[cfg(test)]
pub mod fixtures {
    use twitch_irc::message::{IRCMessage, ServerMessage};

    pub fn server_message(line: &str) -> ServerMessage {
        ServerMessage::try_from(IRCMessage::parse(line).unwrap()).unwrap()
    }

    pub fn privmsg(channel: &str, display_name: &str, text: &str, id: &str) -> ServerMessage {
        let login = display_name.to_lowercase();
        server_message(&format!(
            "@badge-info=;badges=;color=#0000FF;display-name={display_name};emotes=;flags=;\
             id={id};mod=0;room-id=11148817;subscriber=0;tmi-sent-ts=1594545155039;turbo=0;\
             user-id=29803735;user-type= \
             :{login}!{login}@{login}.tmi.twitch.tv PRIVMSG #{channel} :{text}"
        ))
    }

    /// `msg-id` is `sub` or `resub`. The streak is shared only when given.
    pub fn sub_notice(
        channel: &str,
        msg_id: &str,
        display_name: &str,
        cumulative_months: u64,
        streak_months: Option<u64>,
        id: &str,
    ) -> ServerMessage {
        let login = display_name.to_lowercase();
        let streak = match streak_months {
            Some(months) => {
                format!("msg-param-should-share-streak=1;msg-param-streak-months={months};")
            }
            None => "msg-param-should-share-streak=0;".to_string(),
        };
        server_message(&format!(
            "@badge-info=subscriber/{cumulative_months};badges=subscriber/0;color=#0000FF;\
             display-name={display_name};emotes=;flags=;id={id};login={login};mod=0;\
             msg-id={msg_id};msg-param-cumulative-months={cumulative_months};\
             msg-param-months=0;{streak}\
             msg-param-sub-plan-name=Channel\\sSubscription\\s({channel});\
             msg-param-sub-plan=1000;room-id=71092938;subscriber=1;\
             system-msg={display_name}\\ssubscribed\\sat\\sTier\\s1.;\
             tmi-sent-ts=1581713640019;user-id=21156217;user-type= \
             :tmi.twitch.tv USERNOTICE #{channel}"
        ))
    }

    pub fn subgift_notice(channel: &str, gifter: &str, recipient: &str, id: &str) -> ServerMessage {
        let gifter_login = gifter.to_lowercase();
        let recipient_login = recipient.to_lowercase();
        server_message(&format!(
            "@badge-info=;badges=sub-gifter/50;color=;display-name={gifter};emotes=;flags=;\
             id={id};login={gifter_login};mod=0;msg-id=subgift;msg-param-gift-months=1;\
             msg-param-months=2;msg-param-recipient-display-name={recipient};\
             msg-param-recipient-id=236653628;\
             msg-param-recipient-user-name={recipient_login};msg-param-sender-count=0;\
             msg-param-sub-plan-name=Channel\\sSubscription\\s({channel});\
             msg-param-sub-plan=1000;room-id=71092938;subscriber=0;\
             system-msg={gifter}\\sgifted\\sa\\sTier\\s1\\ssub\\sto\\s{recipient}!;\
             tmi-sent-ts=1594583782376;user-id=211711554;user-type= \
             :tmi.twitch.tv USERNOTICE #{channel}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{privmsg, sub_notice, subgift_notice};
    use super::*;
    use crate::common::messages::{ChannelScope, SubKind};

    const MESSAGE_ID: &str = "e9d998c3-36f1-430f-89ec-6b887c28af36";

    #[test]
    fn test_privmsg_normalized() {
        let message = privmsg("pajlada", "JuN1oRRRR", "dank cam", MESSAGE_ID);
        let event = normalize(message, "relaybot").unwrap();
        let TwitchEvent::Chat(msg) = event else {
            panic!("expected chat");
        };
        assert_eq!(msg.author_display_name, "JuN1oRRRR");
        assert_eq!(msg.body, "dank cam");
        assert_eq!(msg.channel_scope, ChannelScope::Twitch("pajlada".to_string()));
        assert!(!msg.is_self_echo);
        assert_eq!(msg.event_id.as_deref(), Some(MESSAGE_ID));
    }

    #[test]
    fn test_privmsg_from_own_login_is_self_echo() {
        let message = privmsg("pajlada", "jun1orrrr", "dank cam", MESSAGE_ID);
        let event = normalize(message, "JUN1ORRRR").unwrap();
        assert!(matches!(event, TwitchEvent::Chat(msg) if msg.is_self_echo));
    }

    #[test]
    fn test_chat_message_self_echo_case_insensitive() {
        let msg = chat_message("#Chan", "relaybot", "RelayBot", "~Discord~ a: b", "1", "RelayBot");
        assert!(msg.is_self_echo);
        assert_eq!(msg.channel_scope, ChannelScope::Twitch("chan".to_string()));

        let msg = chat_message("chan", "viewer", "Viewer", "hi", "2", "relaybot");
        assert!(!msg.is_self_echo);
    }

    #[test]
    fn test_sub_notice_normalized() {
        let message = sub_notice("xqcow", "sub", "Fresh", 1, None, "sub-1");
        let Some(TwitchEvent::Subscription { channel, event }) = normalize(message, "relaybot")
        else {
            panic!("expected a subscription");
        };
        assert_eq!(channel, "xqcow");
        assert_eq!(event.kind, SubKind::NewSub);
        assert_eq!(event.username, "Fresh");
        assert_eq!(event.cumulative_months, Some(1));
        assert_eq!(event.streak_months, None);
        assert_eq!(event.event_id.as_deref(), Some("sub-1"));
    }

    #[test]
    fn test_resub_notice_with_streak() {
        let message = sub_notice("xqcow", "resub", "Gutrin", 2, Some(2), "resub-1");
        let Some(TwitchEvent::Resub { event, .. }) = normalize(message, "relaybot") else {
            panic!("expected a resub");
        };
        assert_eq!(event.kind, SubKind::Resub);
        assert_eq!(event.username, "Gutrin");
        assert_eq!(event.cumulative_months, Some(2));
        assert_eq!(event.streak_months, Some(2));
    }

    #[test]
    fn test_resub_notice_without_streak() {
        let message = sub_notice("xqcow", "resub", "Gutrin", 7, None, "resub-2");
        let Some(TwitchEvent::Resub { event, .. }) = normalize(message, "relaybot") else {
            panic!("expected a resub");
        };
        assert_eq!(event.cumulative_months, Some(7));
        assert_eq!(event.streak_months, None);
    }

    #[test]
    fn test_subgift_notice_takes_recipient_display_name() {
        let message = subgift_notice("xqcow", "AdamAtReflectStudios", "Qatarking24xd", "gift-1");
        let Some(TwitchEvent::SubGift { channel, event }) = normalize(message, "relaybot") else {
            panic!("expected a gift sub");
        };
        assert_eq!(channel, "xqcow");
        assert_eq!(event.kind, SubKind::GiftSub);
        assert_eq!(event.username, "AdamAtReflectStudios");
        assert_eq!(event.recipient.as_deref(), Some("Qatarking24xd"));
        assert_eq!(event.event_id.as_deref(), Some("gift-1"));
    }
}
