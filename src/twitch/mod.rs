//! Twitch side of the relay.

pub mod client;
pub mod events;
pub mod outlet;

pub use client::connect;
pub use events::{normalize, TwitchEvent};
pub use outlet::IrcOutlet;
