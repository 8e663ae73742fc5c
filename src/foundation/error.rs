/// Convenience result type used across the bot.
pub type BotResult<T> = Result<T, BotError>;

/// Top-level error taxonomy used by the engine and dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// A command could not resolve a required target or caption.
    ///
    /// This is not a user-facing failure: the dispatcher drops the message silently.
    #[error("argument missing: {0}")]
    ArgumentMissing(String),

    /// A background, avatar, font or animation failed to fetch or decode.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Invalid template, layout or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while drawing or encoding output media.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    /// Build a [`BotError::ArgumentMissing`] value.
    pub fn argument_missing(msg: impl Into<String>) -> Self {
        Self::ArgumentMissing(msg.into())
    }

    /// Build a [`BotError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`BotError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BotError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Whether this error should end the invocation without any reply.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::ArgumentMissing(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
