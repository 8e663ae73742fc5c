use std::{sync::Arc, time::Instant};

use async_trait::async_trait;

use crate::{
    assets::source::{AssetRef, AssetSources},
    assets::store::{AssetRequest, PreparedAssetStore},
    dispatch::args::{ResolvedArguments, UserRef, resolve, truncate_chars},
    dispatch::reply::{EmbedReply, MediaResult, Reply},
    dispatch::router::{
        CaptionPolicy, CommandAction, CommandDefinition, CommandExecutor, CommandTable,
        MessageContext, TargetPolicy,
    },
    dispatch::variant,
    foundation::core::Color,
    foundation::error::{BotError, BotResult},
    render::animate::compose_animated_layout,
    render::compose::{LayoutBindings, LayoutPainter, SubjectBinding, compose_static},
    render::encode::{GIF_MIME, PNG_MIME, encode_gif, encode_png},
    template::model::{ImagePlacement, ImageSource, Placement, TemplateVariant, VariantKind},
};

pub const DEFAULT_AVATAR_SIZE: u32 = 256;
const EMBED_COLOR: Color = Color::rgb(0x58, 0x65, 0xf2);

/// Executes routed commands: resolves arguments, loads assets, composes and encodes media.
pub struct MediaEngine {
    table: Arc<CommandTable>,
    sources: AssetSources,
    avatar_size: u32,
    prefix: String,
}

impl MediaEngine {
    pub fn new(table: Arc<CommandTable>, sources: AssetSources) -> Self {
        Self {
            table,
            sources,
            avatar_size: DEFAULT_AVATAR_SIZE,
            prefix: "!".to_string(),
        }
    }

    pub fn with_avatar_size(mut self, size: u32) -> Self {
        self.avatar_size = size;
        self
    }

    /// Prefix shown in the help listing.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn avatar_size(&self) -> u32 {
        self.avatar_size
    }

    pub fn table(&self) -> &Arc<CommandTable> {
        &self.table
    }

    fn help_text(&self) -> String {
        let mut out = String::from("Available commands:");
        for cmd in self.table.iter() {
            out.push_str(&format!("\n`{}{}`", self.prefix, cmd.token));
            if !cmd.aliases.is_empty() {
                out.push_str(&format!(" ({})", cmd.aliases.join(", ")));
            }
            out.push_str(&format!(" - {}", cmd.description));
        }
        out
    }

    fn avatar_embed(&self, subject: &UserRef) -> BotResult<Reply> {
        let url = subject
            .avatar_url(4096)
            .ok_or_else(|| BotError::argument_missing("user has no avatar"))?;
        let image_url = subject.avatar_url(1024).unwrap_or_else(|| url.clone());
        Ok(Reply::Embed(EmbedReply {
            title: format!("{}'s avatar", subject.display_name),
            url,
            color: EMBED_COLOR,
            image_url,
            timestamp: chrono::Utc::now(),
        }))
    }

    /// Pick a variant, load everything it needs concurrently, then compose off the async runtime.
    #[tracing::instrument(
        level = "debug",
        target = "engine",
        skip_all,
        fields(command = %command.token)
    )]
    pub async fn render_media(
        &self,
        command: &CommandDefinition,
        variants: &[TemplateVariant],
        subjects: &[UserRef],
        invoker: &UserRef,
        caption: String,
    ) -> BotResult<MediaResult> {
        let idx = variant::select(variants.len());
        let variant = variants
            .get(idx)
            .cloned()
            .ok_or_else(|| BotError::validation(format!("'{}' has no variants", command.token)))?;

        let mut requests = variant.template_requests();
        let mut bind = |user: &UserRef| {
            let avatar = user.avatar_url(self.avatar_size).map(AssetRef::remote);
            if let Some(asset) = &avatar {
                requests.push(AssetRequest::image(asset.clone()));
            }
            SubjectBinding {
                display_name: user.display_name.clone(),
                avatar,
            }
        };
        let subjects = subjects.iter().map(&mut bind).collect();
        let invoker = if uses_invoker_avatar(&variant) {
            bind(invoker)
        } else {
            SubjectBinding {
                display_name: invoker.display_name.clone(),
                avatar: None,
            }
        };
        let bindings = LayoutBindings {
            caption,
            subjects,
            invoker,
        };

        let store = PreparedAssetStore::prepare(&requests, &self.sources).await?;

        let started = Instant::now();
        let file_stem = command.token.clone();
        let variant_id = variant.variant_id;
        let media = tokio::task::spawn_blocking(move || {
            compose_variant(&variant, &store, &bindings, &file_stem)
        })
        .await
        .map_err(|e| BotError::render(format!("composition task failed: {e}")))??;

        tracing::info!(
            target: "engine",
            command = %command.token,
            variant = variant_id,
            mime = media.mime_type,
            bytes = media.buffer.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "media composed"
        );
        Ok(media)
    }
}

#[async_trait]
impl CommandExecutor for MediaEngine {
    async fn execute(
        &self,
        command: &CommandDefinition,
        ctx: &MessageContext,
    ) -> BotResult<Option<Reply>> {
        let args = resolve(
            &ctx.raw_text,
            &ctx.mentioned_users,
            &ctx.invoking_user,
            &ctx.known_users,
        );

        match &command.action {
            CommandAction::Text(s) => Ok(Some(Reply::text(s.clone()))),
            CommandAction::Help => Ok(Some(Reply::text(self.help_text()))),
            CommandAction::Avatar => {
                let subjects = bind_subjects(command, &args)?;
                let subject = subjects.first().unwrap_or(&args.invoking_user);
                self.avatar_embed(subject).map(Some)
            }
            CommandAction::Media(variants) => {
                let subjects = bind_subjects(command, &args)?;
                let caption = bind_caption(command, &args)?;
                let media = self
                    .render_media(command, variants, &subjects, &args.invoking_user, caption)
                    .await?;
                Ok(Some(Reply::File(media)))
            }
        }
    }
}

/// Subjects the layout draws, per the command's target policy.
pub fn bind_subjects(
    command: &CommandDefinition,
    args: &ResolvedArguments,
) -> BotResult<Vec<UserRef>> {
    match command.targets {
        TargetPolicy::None => Ok(Vec::new()),
        TargetPolicy::Required(n) if args.target_users.len() < n => {
            Err(BotError::argument_missing(format!(
                "'{}' needs {n} target(s), got {}",
                command.token,
                args.target_users.len()
            )))
        }
        TargetPolicy::Required(n) => Ok(args.target_users[..n].to_vec()),
        TargetPolicy::OrSelf => Ok(vec![
            args.target_users
                .first()
                .unwrap_or(&args.invoking_user)
                .clone(),
        ]),
    }
}

/// Caption the layout draws, per the command's caption policy.
///
/// A word the tag fallback turned into a target is dropped only for commands that take targets.
pub fn bind_caption(command: &CommandDefinition, args: &ResolvedArguments) -> BotResult<String> {
    let full = match command.targets {
        TargetPolicy::None => args.caption_text.clone(),
        _ => args.caption_without_fallback_tag(),
    };
    let caption = match command.max_caption_chars {
        Some(n) => truncate_chars(&full, n),
        None => &full,
    };
    match command.caption {
        CaptionPolicy::Ignored => Ok(String::new()),
        CaptionPolicy::Required if caption.is_empty() => Err(BotError::argument_missing(
            format!("'{}' needs a caption", command.token),
        )),
        CaptionPolicy::Required | CaptionPolicy::Optional => Ok(caption.to_string()),
    }
}

fn uses_invoker_avatar(variant: &TemplateVariant) -> bool {
    variant.layout.placements.iter().any(|p| {
        matches!(
            p,
            Placement::Image(ImagePlacement {
                source: ImageSource::Invoker,
                ..
            })
        )
    })
}

/// Compose and encode one variant from an already prepared store.
pub fn compose_variant(
    variant: &TemplateVariant,
    store: &PreparedAssetStore,
    bindings: &LayoutBindings,
    file_stem: &str,
) -> BotResult<MediaResult> {
    let mut painter = LayoutPainter::new(store, bindings);
    let placements = &variant.layout.placements;
    match variant.kind {
        VariantKind::Static => {
            let background = store.image(&variant.background())?;
            let frame = compose_static(background, placements, &mut painter)?;
            Ok(MediaResult {
                buffer: encode_png(&frame)?,
                mime_type: PNG_MIME,
                file_name: format!("{file_stem}.png"),
            })
        }
        VariantKind::Animated { fps } => {
            let source = store.animation(&variant.background())?;
            let anim = compose_animated_layout(source, fps, placements, &mut painter)?;
            Ok(MediaResult {
                buffer: encode_gif(&anim)?,
                mime_type: GIF_MIME,
                file_name: format!("{file_stem}.gif"),
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/media.rs"]
mod tests;
