use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    dispatch::args::{UserDirectory, UserRef},
    dispatch::reply::{Reply, ReplySink},
    foundation::error::{BotError, BotResult},
    template::model::TemplateVariant,
};

/// Reply sent when a command fails for any reason other than missing arguments.
pub const GENERIC_FAILURE_REPLY: &str = "An error occurred while processing the command.";
/// Reply sent for a prefixed token that is not in the command table.
pub const UNRECOGNIZED_REPLY: &str = "Command not recognized.";

/// How many targets a command needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "count", rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Targets are not used.
    None,
    /// At least `n` resolved targets, otherwise the command is a no-op.
    Required(usize),
    /// The first target, or the invoking user when nobody was targeted.
    OrSelf,
}

impl TargetPolicy {
    /// Number of subjects a layout may draw under this policy.
    pub fn bound_subjects(self) -> usize {
        match self {
            Self::None => 0,
            Self::Required(n) => n,
            Self::OrSelf => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPolicy {
    Ignored,
    /// An empty caption makes the command a no-op.
    Required,
    Optional,
}

/// What a command does once routed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    /// Fixed plain-text reply.
    Text(String),
    /// Plain-text listing of the command table.
    Help,
    /// Rich-content card linking the subject's avatar.
    Avatar,
    /// Generated media from one of the variants, picked uniformly per invocation.
    Media(Vec<TemplateVariant>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommandDefinition {
    pub token: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub description: String,
    pub targets: TargetPolicy,
    pub caption: CaptionPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_caption_chars: Option<usize>,
    pub action: CommandAction,
}

impl CommandDefinition {
    pub fn new(token: &str, description: &str, action: CommandAction) -> Self {
        Self {
            token: token.to_string(),
            aliases: Vec::new(),
            description: description.to_string(),
            targets: TargetPolicy::None,
            caption: CaptionPolicy::Ignored,
            max_caption_chars: None,
            action,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn targets(mut self, policy: TargetPolicy) -> Self {
        self.targets = policy;
        self
    }

    pub fn caption(mut self, policy: CaptionPolicy) -> Self {
        self.caption = policy;
        self
    }

    pub fn max_caption_chars(mut self, n: usize) -> Self {
        self.max_caption_chars = Some(n);
        self
    }

    fn validate(&self) -> BotResult<()> {
        for t in std::iter::once(&self.token).chain(&self.aliases) {
            if t.is_empty() || t.chars().any(char::is_whitespace) {
                return Err(BotError::validation(format!(
                    "command token '{t}' must be a single non-empty word"
                )));
            }
        }
        if let CommandAction::Media(variants) = &self.action {
            if variants.is_empty() {
                return Err(BotError::validation(format!(
                    "media command '{}' has no variants",
                    self.token
                )));
            }
            let bound = self.targets.bound_subjects();
            for v in variants {
                v.validate()?;
                if v.subjects_used() > bound {
                    return Err(BotError::validation(format!(
                        "'{}' variant {} draws {} subject(s) but its target policy binds {bound}",
                        self.token,
                        v.variant_id,
                        v.subjects_used()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Immutable token → command mapping, built once at startup.
#[derive(Debug)]
pub struct CommandTable {
    commands: Vec<Arc<CommandDefinition>>,
    by_token: HashMap<String, usize>,
}

impl CommandTable {
    /// Build the table; tokens and aliases are matched case-insensitively and must be unique.
    pub fn new(definitions: Vec<CommandDefinition>) -> BotResult<Self> {
        let mut commands = Vec::with_capacity(definitions.len());
        let mut by_token = HashMap::new();
        for (idx, def) in definitions.into_iter().enumerate() {
            def.validate()?;
            for t in std::iter::once(&def.token).chain(&def.aliases) {
                if by_token.insert(t.to_lowercase(), idx).is_some() {
                    return Err(BotError::validation(format!(
                        "command token '{t}' is registered twice"
                    )));
                }
            }
            commands.push(Arc::new(def));
        }
        Ok(Self { commands, by_token })
    }

    pub fn lookup(&self, token: &str) -> Option<&Arc<CommandDefinition>> {
        self.by_token
            .get(&token.to_lowercase())
            .and_then(|&i| self.commands.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One user-authored message as delivered by the platform adapter.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub raw_text: String,
    /// Unique, in order of first mention in the text.
    pub mentioned_users: Vec<UserRef>,
    pub author: UserRef,
    pub author_is_self: bool,
    pub author_is_bot: bool,
    pub known_users: UserDirectory,
}

/// What a command handler gets to see.
#[derive(Clone, Debug)]
pub struct MessageContext {
    pub raw_text: String,
    pub mentioned_users: Vec<UserRef>,
    pub invoking_user: UserRef,
    pub known_users: UserDirectory,
}

impl From<InboundMessage> for MessageContext {
    fn from(msg: InboundMessage) -> Self {
        Self {
            raw_text: msg.raw_text,
            mentioned_users: msg.mentioned_users,
            invoking_user: msg.author,
            known_users: msg.known_users,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// Not for us: no prefix, our own message, or a filtered bot.
    Ignored,
    Unrecognized { token: String },
    Command(Arc<CommandDefinition>),
}

/// Prefix filter plus flat, case-insensitive token lookup.
#[derive(Clone, Debug)]
pub struct Router {
    prefix: String,
    ignore_bots: bool,
    table: Arc<CommandTable>,
}

impl Router {
    pub fn new(prefix: impl Into<String>, table: Arc<CommandTable>) -> Self {
        Self {
            prefix: prefix.into(),
            ignore_bots: true,
            table,
        }
    }

    pub fn ignore_bots(mut self, ignore: bool) -> Self {
        self.ignore_bots = ignore;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn table(&self) -> &Arc<CommandTable> {
        &self.table
    }

    pub fn route(&self, msg: &InboundMessage) -> Route {
        if msg.author_is_self || (self.ignore_bots && msg.author_is_bot) {
            return Route::Ignored;
        }
        let Some(body) = msg.raw_text.strip_prefix(self.prefix.as_str()) else {
            return Route::Ignored;
        };
        let token = body
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if token.is_empty() {
            return Route::Ignored;
        }
        match self.table.lookup(&token) {
            Some(cmd) => Route::Command(Arc::clone(cmd)),
            None => Route::Unrecognized { token },
        }
    }
}

/// Runs a routed command. `Ok(None)` is a silent no-op.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        command: &CommandDefinition,
        ctx: &MessageContext,
    ) -> BotResult<Option<Reply>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored,
    Unrecognized,
    NoOp,
    Replied,
    /// The generic failure reply was sent (or delivery itself failed).
    Failed,
}

/// Routes messages, runs commands and delivers at most one reply per message.
///
/// Shares no mutable state between messages, so any number of dispatches may run concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    executor: Arc<dyn CommandExecutor>,
}

impl Dispatcher {
    pub fn new(router: Router, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { router, executor }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    #[tracing::instrument(
        level = "debug",
        target = "dispatch",
        skip_all,
        fields(author = %msg.author.id)
    )]
    pub async fn dispatch(&self, msg: InboundMessage, sink: &dyn ReplySink) -> DispatchOutcome {
        let command = match self.router.route(&msg) {
            Route::Ignored => return DispatchOutcome::Ignored,
            Route::Unrecognized { token } => {
                tracing::debug!(target: "dispatch", %token, "unrecognized command");
                return match sink.send(Reply::text(UNRECOGNIZED_REPLY)).await {
                    Ok(()) => DispatchOutcome::Unrecognized,
                    Err(e) => {
                        tracing::error!(target: "dispatch", error = %e, "reply delivery failed");
                        DispatchOutcome::Failed
                    }
                };
            }
            Route::Command(cmd) => cmd,
        };

        let ctx = MessageContext::from(msg);
        let reply = match self.executor.execute(&command, &ctx).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                tracing::debug!(target: "dispatch", command = %command.token, "no-op");
                return DispatchOutcome::NoOp;
            }
            Err(e) if e.is_silent() => {
                tracing::debug!(target: "dispatch", command = %command.token, reason = %e, "no-op");
                return DispatchOutcome::NoOp;
            }
            Err(e) => {
                tracing::error!(target: "dispatch", command = %command.token, error = %e, "command failed");
                if let Err(e) = sink.send(Reply::text(GENERIC_FAILURE_REPLY)).await {
                    tracing::error!(target: "dispatch", error = %e, "reply delivery failed");
                }
                return DispatchOutcome::Failed;
            }
        };

        let kind = reply.kind();
        match sink.send(reply).await {
            Ok(()) => {
                tracing::info!(target: "dispatch", command = %command.token, kind, "replied");
                DispatchOutcome::Replied
            }
            Err(e) => {
                tracing::error!(target: "dispatch", command = %command.token, error = %e, "reply delivery failed");
                DispatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/router.rs"]
mod tests;
