//! Outbound send seams and fire-and-forget delivery.
//!
//! The router only ever talks to the platforms through these traits, so
//! the relay policy can be exercised without a live connection.

use std::future::Future;

use serenity::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::commands::Reply;
use crate::common::error::SendError;

/// Sending side of the Twitch chat client.
#[async_trait]
pub trait TwitchOutlet: Send + Sync {
    /// Send a chat line to a channel.
    async fn say(&self, channel: &str, text: &str) -> Result<(), SendError>;
}

/// Sending side of the Discord client.
#[async_trait]
pub trait DiscordOutlet: Send + Sync {
    /// Whether the channel is known to the local cache.
    fn resolve_channel(&self, channel_id: u64) -> bool;

    /// Send a plain text message to a channel.
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), SendError>;

    /// Answer a command, referencing the invoking message when known.
    async fn reply(
        &self,
        channel_id: u64,
        reply_to: Option<u64>,
        reply: &Reply,
    ) -> Result<(), SendError>;
}

/// Start one delivery attempt without waiting for it.
///
/// The outcome is logged with the full outbound text; failures are final.
pub fn spawn_delivery<F>(route: &'static str, text: String, send: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), SendError>> + Send + 'static,
{
    tokio::spawn(async move {
        match send.await {
            Ok(()) => info!(route = route, "Relayed message: \"{}\"", text),
            Err(e) => error!(route = route, error = %e, "Error relaying message: \"{}\"", text),
        }
    })
}

/// Outlets that record every send instead of talking to a platform.
#[cfg(test)]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingTwitch {
        said: Mutex<Vec<(String, String)>>,
    }

    impl RecordingTwitch {
        pub fn said(&self) -> Vec<(String, String)> {
            self.said.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TwitchOutlet for RecordingTwitch {
        async fn say(&self, channel: &str, text: &str) -> Result<(), SendError> {
            self.said
                .lock()
                .unwrap()
                .push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }

    pub struct RecordingDiscord {
        known_channel: u64,
        pub resolvable: bool,
        pub fail: bool,
        sent: Mutex<Vec<(u64, String)>>,
        replies: Mutex<Vec<(u64, Option<u64>, Reply)>>,
    }

    impl RecordingDiscord {
        pub fn new(known_channel: u64) -> Self {
            Self {
                known_channel,
                resolvable: true,
                fail: false,
                sent: Mutex::new(Vec::new()),
                replies: Mutex::new(Vec::new()),
            }
        }

        pub fn sent(&self) -> Vec<(u64, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn replies(&self) -> Vec<(u64, Option<u64>, Reply)> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DiscordOutlet for RecordingDiscord {
        fn resolve_channel(&self, channel_id: u64) -> bool {
            self.resolvable && channel_id == self.known_channel
        }

        async fn send(&self, channel_id: u64, text: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push((channel_id, text.to_string()));
            if self.fail {
                return Err(SendError::Rejected {
                    message: "Missing Permissions".to_string(),
                });
            }
            Ok(())
        }

        async fn reply(
            &self,
            channel_id: u64,
            reply_to: Option<u64>,
            reply: &Reply,
        ) -> Result<(), SendError> {
            self.replies
                .lock()
                .unwrap()
                .push((channel_id, reply_to, reply.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_delivery_is_contained() {
        let handle = spawn_delivery("test", "hello".to_string(), async {
            Err(SendError::NotConnected { platform: "Twitch" })
        });
        assert!(handle.await.is_ok());
    }
}
