//! twitch-irc-backed [`TwitchOutlet`].

use serenity::async_trait;

use crate::bridge::outlet::TwitchOutlet;
use crate::common::error::SendError;

use super::client::TwitchClient;

pub struct IrcOutlet {
    client: TwitchClient,
}

impl IrcOutlet {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TwitchOutlet for IrcOutlet {
    async fn say(&self, channel: &str, text: &str) -> Result<(), SendError> {
        self.client
            .say(channel.to_string(), text.to_string())
            .await
            .map_err(|e| SendError::Rejected {
                message: e.to_string(),
            })
    }
}
