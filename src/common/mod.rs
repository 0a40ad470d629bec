//! Types shared across the relay.

pub mod error;
pub mod messages;
