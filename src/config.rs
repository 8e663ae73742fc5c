use std::path::PathBuf;

use clap::{ArgAction, Args};

use crate::{
    engine::media::DEFAULT_AVATAR_SIZE,
    foundation::error::{BotError, BotResult},
};

/// Runtime settings, read from flags or the environment (`.env` included).
#[derive(Clone, Args)]
pub struct BotConfig {
    /// Bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Command prefix.
    #[arg(long, env = "BOT_PREFIX", default_value = "!")]
    pub prefix: String,

    /// Directory holding templates and fonts.
    #[arg(long, env = "ASSETS_ROOT", default_value = "assets")]
    pub assets_root: PathBuf,

    /// Requested avatar size in pixels.
    #[arg(long, env = "AVATAR_SIZE", default_value_t = DEFAULT_AVATAR_SIZE)]
    pub avatar_size: u32,

    /// Ignore messages written by other bots.
    #[arg(long, env = "IGNORE_BOTS", default_value_t = true, action = ArgAction::Set)]
    pub ignore_bots: bool,

    /// Serve a liveness endpoint on this port.
    #[arg(long = "port", env = "PORT")]
    pub keepalive_port: Option<u16>,
}

impl BotConfig {
    /// Check everything needed to connect; returns the token.
    pub fn validate(&self) -> BotResult<&str> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BotError::validation("DISCORD_TOKEN must be provided"))?;
        if self.prefix.is_empty() || self.prefix.chars().any(char::is_whitespace) {
            return Err(BotError::validation(
                "command prefix must be non-empty and contain no whitespace",
            ));
        }
        if self.avatar_size == 0 {
            return Err(BotError::validation("avatar size must be > 0"));
        }
        Ok(token)
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("assets_root", &self.assets_root)
            .field("avatar_size", &self.avatar_size)
            .field("ignore_bots", &self.ignore_bots)
            .field("keepalive_port", &self.keepalive_port)
            .finish()
    }
}

/// Load `.env` from the working directory or its parents; a missing file is fine.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
