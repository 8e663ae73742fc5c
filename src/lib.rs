//! Memeforge is a chat-bot command responder that answers prefixed commands with generated
//! images and short animations.
//!
//! # Pipeline overview
//!
//! 1. **Route**: `InboundMessage -> Route` (prefix filter, flat case-insensitive table lookup)
//! 2. **Resolve**: raw text + mentions -> `ResolvedArguments` (targets, caption)
//! 3. **Prepare**: every asset a variant needs is fetched and decoded concurrently into a
//!    per-invocation [`PreparedAssetStore`]
//! 4. **Compose**: static canvas or frame-by-frame animation, on a blocking worker
//! 5. **Encode + reply**: PNG or GIF handed to a [`ReplySink`]
//!
//! Constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No IO in composers**: external IO is front-loaded in [`PreparedAssetStore::prepare`].
//! - **Premultiplied RGBA8** from decode to encode; only encoders unpremultiply.
//! - **No shared mutable state** between concurrently handled messages; the command table is
//!   immutable after startup.
#![forbid(unsafe_code)]

pub mod foundation {
    pub mod core;
    pub mod error;
}

pub mod assets {
    pub mod decode;
    pub mod source;
    pub mod store;
}

pub mod template {
    pub mod dsl;
    pub mod model;
}

pub mod render {
    pub mod animate;
    pub mod compose;
    pub mod encode;
    pub mod surface;
}

pub mod dispatch {
    pub mod args;
    pub mod reply;
    pub mod router;
    pub mod variant;
}

pub mod commands {
    pub mod catalog;
}

pub mod engine {
    pub mod media;
}

pub mod discord {
    pub mod handler;
}

pub mod config;
pub mod keepalive;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod testutil;

pub use assets::source::{
    AssetRef, AssetSources, ByteSource, FsSource, HttpSource, MemorySource, normalize_rel_path,
};
pub use assets::store::{
    AssetKind, AssetRequest, PreparedAnimation, PreparedAsset, PreparedAssetStore, PreparedFont,
    PreparedImage,
};
pub use commands::catalog::{builtin_commands, builtin_table, required_assets};
pub use config::BotConfig;
pub use dispatch::args::{ResolvedArguments, UserDirectory, UserRef, resolve};
pub use dispatch::reply::{EmbedReply, MediaResult, Reply, ReplySink};
pub use dispatch::router::{
    CaptionPolicy, CommandAction, CommandDefinition, CommandExecutor, CommandTable,
    DispatchOutcome, Dispatcher, GENERIC_FAILURE_REPLY, InboundMessage, MessageContext, Route,
    Router, TargetPolicy, UNRECOGNIZED_REPLY,
};
pub use engine::media::MediaEngine;
pub use foundation::core::{Canvas, Color, Fps};
pub use foundation::error::{BotError, BotResult};
pub use template::model::{LayoutSpec, Placement, TemplateVariant, VariantKind};
