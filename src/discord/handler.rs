use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Client, Context, CreateAttachment, CreateEmbed, CreateMessage, EventHandler,
    GatewayIntents, Http, Message, Ready, Timestamp, User,
};

use crate::{
    dispatch::args::{UserDirectory, UserRef},
    dispatch::reply::{Reply, ReplySink},
    dispatch::router::{DispatchOutcome, Dispatcher, InboundMessage},
    foundation::error::BotResult,
};

/// Gateway intents needed to read prefixed messages.
///
/// `GUILD_MEMBERS` (privileged) fills the member cache the tag fallback looks users up in; it
/// has to be enabled for the application in the developer portal.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT
}

/// Connect to the gateway and dispatch messages until the client stops.
pub async fn run(token: &str, dispatcher: Dispatcher) -> BotResult<()> {
    let mut client = Client::builder(token, intents())
        .event_handler(Handler::new(dispatcher))
        .await
        .context("create discord client")?;
    client.start().await.context("discord client stopped")?;
    Ok(())
}

pub struct Handler {
    dispatcher: Dispatcher,
}

impl Handler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            target: "discord",
            guilds = ready.guilds.len(),
            "Logged in as {}",
            ready.user.tag()
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if !msg
            .content
            .starts_with(self.dispatcher.router().prefix())
        {
            return;
        }

        let inbound = inbound_message(&ctx, &msg);
        let sink = ChannelSink::new(ctx.http.clone(), msg.channel_id);
        let outcome = self.dispatcher.dispatch(inbound, &sink).await;
        if outcome != DispatchOutcome::Ignored {
            tracing::debug!(
                target: "discord",
                channel = %msg.channel_id,
                message = %msg.id,
                ?outcome,
                "message handled"
            );
        }
    }
}

fn inbound_message(ctx: &Context, msg: &Message) -> InboundMessage {
    let self_id = ctx.cache.current_user().id;
    // Tags are only looked up when nobody was mentioned.
    let known_users = if msg.mentions.is_empty() {
        member_directory(ctx, msg)
    } else {
        UserDirectory::new()
    };

    InboundMessage {
        raw_text: msg.content.clone(),
        mentioned_users: ordered_mentions(&msg.content, &msg.mentions)
            .into_iter()
            .map(|u| user_ref(u, None))
            .collect(),
        author: user_ref(&msg.author, None),
        author_is_self: msg.author.id == self_id,
        author_is_bot: msg.author.bot,
        known_users,
    }
}

fn member_directory(ctx: &Context, msg: &Message) -> UserDirectory {
    msg.guild(&ctx.cache)
        .map(|guild| {
            UserDirectory::from_users(
                guild
                    .members
                    .values()
                    .map(|m| user_ref(&m.user, Some(m.display_name()))),
            )
        })
        .unwrap_or_default()
}

fn user_ref(user: &User, display_name: Option<&str>) -> UserRef {
    let display_name = display_name
        .map(str::to_string)
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone());
    UserRef::new(user.id.to_string(), display_name, user.tag()).with_avatar(user.face())
}

/// Mentioned users ordered by where their mention first appears in `content`, without
/// duplicates. Users whose mention cannot be located keep their relative order at the end.
pub(crate) fn ordered_mentions<'a>(content: &str, mentions: &'a [User]) -> Vec<&'a User> {
    let mut seen = std::collections::HashSet::new();
    let mut users: Vec<(usize, &User)> = mentions
        .iter()
        .filter(|u| seen.insert(u.id))
        .map(|u| (mention_position(content, &u.id.to_string()), u))
        .collect();
    users.sort_by_key(|(pos, _)| *pos);
    users.into_iter().map(|(_, u)| u).collect()
}

fn mention_position(content: &str, id: &str) -> usize {
    [format!("<@{id}>"), format!("<@!{id}>")]
        .iter()
        .filter_map(|pat| content.find(pat.as_str()))
        .min()
        .unwrap_or(usize::MAX)
}

/// Delivers replies to one channel.
pub struct ChannelSink {
    http: Arc<Http>,
    channel: ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        Self { http, channel }
    }
}

#[async_trait]
impl ReplySink for ChannelSink {
    async fn send(&self, reply: Reply) -> BotResult<()> {
        let builder = match reply {
            Reply::Text(text) => CreateMessage::new().content(text),
            Reply::Embed(embed) => {
                let timestamp = Timestamp::from_unix_timestamp(embed.timestamp.timestamp())
                    .unwrap_or_else(|_| Timestamp::now());
                CreateMessage::new().embed(
                    CreateEmbed::new()
                        .title(embed.title)
                        .url(embed.url)
                        .color(embed.color.to_rgb_u32())
                        .image(embed.image_url)
                        .timestamp(timestamp),
                )
            }
            Reply::File(media) => CreateMessage::new()
                .add_file(CreateAttachment::bytes(media.buffer, media.file_name)),
        };
        self.channel
            .send_message(&self.http, builder)
            .await
            .context("deliver reply")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/discord/handler.rs"]
mod tests;
