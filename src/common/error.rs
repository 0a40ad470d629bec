//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Outbound delivery errors.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("{platform} is not connected")]
    NotConnected { platform: &'static str },

    #[error("Channel not found: {channel}")]
    ChannelNotFound { channel: String },

    #[error("Send rejected: {message}")]
    Rejected { message: String },
}

/// Upstream event that does not satisfy its contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Malformed event: missing {field}")]
    MissingField { field: &'static str },
}

/// Command registration errors.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command has no name")]
    MissingName,

    #[error("Command '{name}' is registered twice")]
    Duplicate { name: String },
}

/// A duel move that is not allowed. The message is shown to the member who
/// tried it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DuelError {
    #[error("You can't duel yourself or a bot!")]
    InvalidOpponent,

    #[error("This duel challenge is not for you!")]
    NotParticipant,

    #[error("It's not your turn!")]
    NotYourTurn,

    #[error("The duel has not started yet!")]
    NotStarted,

    #[error("This duel has already started!")]
    AlreadyStarted,

    #[error("This duel is no longer active.")]
    Expired,
}
