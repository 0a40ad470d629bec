//! Prefixed Discord text commands (`!help`, `!ping`, `!duel`).
//!
//! Commands are collected into an immutable [`CommandRegistry`] by an
//! explicit registration step at startup, then looked up by name when a
//! prefixed message arrives.

pub mod duel;
pub mod help;
pub mod ping;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::async_trait;
use tracing::{debug, error, info};

use crate::common::error::CommandError;
use crate::common::messages::UserRef;

use self::duel::{DuelBoard, DuelCommand};

/// What a command answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Embed(EmbedReply),
}

/// Platform-neutral description of a rich embed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedReply {
    pub title: String,
    pub description: Option<String>,
    /// (name, value, inline)
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
    pub author: Option<String>,
    /// 0xRRGGBB
    pub colour: Option<u32>,
    /// Stamp the embed with the time it was sent.
    pub timestamp: bool,
    /// One row of buttons under the embed.
    pub buttons: Vec<ReplyButton>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Primary,
    Success,
    Danger,
}

/// A message button. Presses come back carrying `custom_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub custom_id: String,
    pub label: String,
    pub tone: ButtonTone,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Lowercased command name.
    pub name: String,
    pub args: Vec<String>,
    /// Display name of the invoking user.
    pub author: String,
    pub author_id: Option<u64>,
    pub mentions: Vec<UserRef>,
}

impl Invocation {
    /// Parse `content` as a command if it starts with `prefix`.
    ///
    /// The first whitespace-delimited token after the prefix is the name;
    /// the remaining tokens are the arguments.
    pub fn parse(content: &str, prefix: &str, author: &str) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        let mut tokens = rest.split_whitespace();
        // A bare prefix, or a prefix followed by a space, names no command.
        let name = if rest.starts_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.next().unwrap_or_default().to_lowercase()
        };

        Some(Self {
            name,
            args: tokens.map(str::to_string).collect(),
            author: author.to_string(),
            author_id: None,
            mentions: Vec::new(),
        })
    }

    pub fn with_author_id(mut self, author_id: Option<u64>) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<UserRef>) -> Self {
        self.mentions = mentions;
        self
    }
}

/// Data available to a running command.
pub struct CommandContext<'a> {
    pub registry: &'a CommandRegistry,
    pub prefix: &'a str,
    pub author: &'a str,
    pub author_id: Option<u64>,
    pub mentions: &'a [UserRef],
    pub started_at: DateTime<Utc>,
}

/// A text command.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;

    /// Permission a member needs to run the command.
    fn permission(&self) -> &str {
        "None"
    }

    /// Where the command may run, e.g. `Guild`.
    fn context(&self) -> &str {
        "None"
    }

    async fn run(&self, ctx: &CommandContext<'_>, args: &[String]) -> anyhow::Result<Reply>;
}

/// Immutable name -> command mapping.
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            commands: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// All commands, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Collects commands before the registry is frozen.
pub struct RegistryBuilder {
    commands: Vec<Arc<dyn Command>>,
}

impl RegistryBuilder {
    pub fn register(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Arc::new(command));
        self
    }

    /// Freeze the registry. Nameless or duplicate commands are rejected.
    pub fn build(self) -> Result<CommandRegistry, CommandError> {
        let mut commands = BTreeMap::new();
        for command in self.commands {
            let name = command.name().trim().to_lowercase();
            if name.is_empty() {
                return Err(CommandError::MissingName);
            }
            if commands.contains_key(&name) {
                return Err(CommandError::Duplicate { name });
            }
            info!("Registered command: {}", name);
            commands.insert(name, command);
        }
        Ok(CommandRegistry { commands })
    }
}

/// Registry holding the built-in commands. `duels` is shared with the
/// button handler that plays them out.
pub fn builtin_registry(duels: Arc<DuelBoard>) -> Result<CommandRegistry, CommandError> {
    CommandRegistry::builder()
        .register(help::HelpCommand)
        .register(ping::PingCommand)
        .register(DuelCommand::new(duels))
        .build()
}

/// Looks up and runs commands, converting every failure into one reply.
pub struct CommandDispatcher {
    registry: CommandRegistry,
    prefix: String,
    started_at: DateTime<Utc>,
}

impl CommandDispatcher {
    pub fn new(registry: CommandRegistry, prefix: impl Into<String>) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            started_at: Utc::now(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run a command and produce the reply for its author.
    ///
    /// Unknown commands and command failures never escape; failure detail
    /// goes to the log only.
    pub async fn dispatch(&self, invocation: &Invocation) -> Reply {
        debug!(
            "Processing command: {} with args: {:?}",
            invocation.name, invocation.args
        );

        let Some(command) = self.registry.get(&invocation.name) else {
            info!(
                "Unknown command \"{}\" from {}",
                invocation.name, invocation.author
            );
            return Reply::Text(format!(
                "Error: \"{}\" No such command.",
                invocation.name
            ));
        };

        let ctx = CommandContext {
            registry: &self.registry,
            prefix: &self.prefix,
            author: &invocation.author,
            author_id: invocation.author_id,
            mentions: &invocation.mentions,
            started_at: self.started_at,
        };

        match command.run(&ctx, &invocation.args).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    command = %invocation.name,
                    error = %e,
                    "Command failed"
                );
                Reply::Text(format!(
                    "Error: \"{}\" could not be completed.",
                    invocation.name
                ))
            }
        }
    }
}
