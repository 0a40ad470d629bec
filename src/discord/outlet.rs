//! Serenity-backed [`DiscordOutlet`].

use std::sync::{Arc, RwLock};

use serenity::all::{
    ButtonStyle, Cache, ChannelId, Colour, ComponentInteraction, Context, CreateActionRow,
    CreateButton, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, Http, MessageId, Timestamp,
};
use serenity::async_trait;
use tracing::warn;

use crate::bridge::outlet::DiscordOutlet;
use crate::commands::duel::DuelResponse;
use crate::commands::{ButtonTone, EmbedReply, Reply, ReplyButton};
use crate::common::error::SendError;

/// Sends to Discord through the current gateway session, if any.
#[derive(Default)]
pub struct SerenityOutlet {
    session: RwLock<Option<(Arc<Http>, Arc<Cache>)>>,
}

impl SerenityOutlet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the HTTP client and cache of a ready session.
    pub fn connect(&self, context: &Context) {
        match self.session.write() {
            Ok(mut session) => {
                *session = Some((Arc::clone(&context.http), Arc::clone(&context.cache)))
            }
            Err(e) => warn!("Discord session lock poisoned: {}", e),
        }
    }

    pub fn disconnect(&self) {
        if let Ok(mut session) = self.session.write() {
            *session = None;
        }
    }

    fn session(&self) -> Option<(Arc<Http>, Arc<Cache>)> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn http(&self) -> Result<Arc<Http>, SendError> {
        self.session()
            .map(|(http, _)| http)
            .ok_or(SendError::NotConnected { platform: "Discord" })
    }

    /// Answer a duel button press, either by editing the duel message or
    /// with a note only the presser sees.
    pub async fn respond(
        &self,
        component: &ComponentInteraction,
        response: &DuelResponse,
    ) -> Result<(), SendError> {
        let http = self.http()?;
        let builder = match response {
            DuelResponse::Update(embed) => CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embed(build_embed(embed))
                    .components(build_components(&embed.buttons)),
            ),
            DuelResponse::Private(text) => CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        };

        component
            .create_response(&http, builder)
            .await
            .map_err(|e| SendError::Rejected {
                message: e.to_string(),
            })
    }
}

fn channel(channel_id: u64) -> Result<ChannelId, SendError> {
    if channel_id == 0 {
        return Err(SendError::ChannelNotFound {
            channel: channel_id.to_string(),
        });
    }
    Ok(ChannelId::new(channel_id))
}

/// Look the channel up in the guilds the cache knows about.
fn guild_has_channel(cache: &Cache, channel_id: ChannelId) -> bool {
    cache.guilds().into_iter().any(|guild_id| {
        cache
            .guild(guild_id)
            .is_some_and(|guild| guild.channels.contains_key(&channel_id))
    })
}

fn build_embed(reply: &EmbedReply) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&reply.title);
    if let Some(description) = &reply.description {
        embed = embed.description(description);
    }
    for (name, value, inline) in &reply.fields {
        embed = embed.field(name, value, *inline);
    }
    if let Some(footer) = &reply.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(author) = &reply.author {
        embed = embed.author(CreateEmbedAuthor::new(author));
    }
    if let Some(colour) = reply.colour {
        embed = embed.colour(Colour::new(colour));
    }
    if reply.timestamp {
        embed = embed.timestamp(Timestamp::now());
    }
    embed
}

/// Buttons go in a single action row; no buttons clears the row.
fn build_components(buttons: &[ReplyButton]) -> Vec<CreateActionRow> {
    if buttons.is_empty() {
        return Vec::new();
    }
    let buttons = buttons
        .iter()
        .map(|button| {
            let style = match button.tone {
                ButtonTone::Primary => ButtonStyle::Primary,
                ButtonTone::Success => ButtonStyle::Success,
                ButtonTone::Danger => ButtonStyle::Danger,
            };
            CreateButton::new(&button.custom_id)
                .label(&button.label)
                .style(style)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

#[async_trait]
impl DiscordOutlet for SerenityOutlet {
    fn resolve_channel(&self, channel_id: u64) -> bool {
        if channel_id == 0 {
            return false;
        }
        match self.session() {
            Some((_, cache)) => guild_has_channel(&cache, ChannelId::new(channel_id)),
            None => false,
        }
    }

    async fn send(&self, channel_id: u64, text: &str) -> Result<(), SendError> {
        let http = self.http()?;
        channel(channel_id)?
            .say(&http, text)
            .await
            .map(|_| ())
            .map_err(|e| SendError::Rejected {
                message: e.to_string(),
            })
    }

    async fn reply(
        &self,
        channel_id: u64,
        reply_to: Option<u64>,
        reply: &Reply,
    ) -> Result<(), SendError> {
        let http = self.http()?;
        let channel_id = channel(channel_id)?;

        let mut builder = match reply {
            Reply::Text(text) => CreateMessage::new().content(text),
            Reply::Embed(embed) => CreateMessage::new()
                .embed(build_embed(embed))
                .components(build_components(&embed.buttons)),
        };
        if let Some(message_id) = reply_to.filter(|id| *id != 0) {
            builder = builder.reference_message((channel_id, MessageId::new(message_id)));
        }

        channel_id
            .send_message(&http, builder)
            .await
            .map(|_| ())
            .map_err(|e| SendError::Rejected {
                message: e.to_string(),
            })
    }
}
