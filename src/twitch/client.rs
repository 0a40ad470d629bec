//! Twitch chat connection.

use tokio::sync::mpsc;
use tracing::info;
use twitch_irc::login::StaticLoginCredentials;
use twitch_irc::message::ServerMessage;
use twitch_irc::{ClientConfig, SecureTCPTransport, TwitchIRCClient};

use crate::common::messages::normalize_twitch_channel;
use crate::config::types::TwitchConfig;

pub type TwitchClient = TwitchIRCClient<SecureTCPTransport, StaticLoginCredentials>;

/// Connect to Twitch chat and join the configured channel.
///
/// The client reconnects on its own; incoming messages keep arriving on the
/// returned receiver until the client is dropped.
pub fn connect(
    config: &TwitchConfig,
    oauth_token: &str,
) -> anyhow::Result<(mpsc::UnboundedReceiver<ServerMessage>, TwitchClient)> {
    let login = config.username.trim().to_lowercase();
    let credentials = StaticLoginCredentials::new(login.clone(), Some(oauth_token.to_string()));
    let (incoming_rx, client) = TwitchClient::new(ClientConfig::new_simple(credentials));

    let channel = normalize_twitch_channel(&config.channel);
    client.join(channel.clone())?;
    info!("Joining Twitch channel #{} as {}", channel, login);

    Ok((incoming_rx, client))
}
