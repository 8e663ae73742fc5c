use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::foundation::{core::Color, error::BotResult};

/// Generated media, handed once to the delivery boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaResult {
    pub buffer: Vec<u8>,
    /// `image/png` or `image/gif`.
    pub mime_type: &'static str,
    pub file_name: String,
}

impl std::fmt::Debug for MediaResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResult")
            .field("bytes", &self.buffer.len())
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Rich-content reply for metadata-only commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedReply {
    pub title: String,
    pub url: String,
    pub color: Color,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed(EmbedReply),
    File(MediaResult),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Embed(_) => "embed",
            Self::File(_) => "file",
        }
    }
}

/// Outbound channel a reply is delivered to.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: Reply) -> BotResult<()>;
}
