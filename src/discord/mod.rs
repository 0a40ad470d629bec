//! Discord side of the relay.

pub mod client;
pub mod events;
pub mod outlet;

pub use client::{DiscordBot, DiscordBotEvent};
pub use outlet::SerenityOutlet;
