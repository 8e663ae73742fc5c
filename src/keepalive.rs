//! Liveness endpoint for hosts that probe HTTP.

use anyhow::Context;
use axum::{Router, routing::get};
use tokio::net::TcpListener;

use crate::foundation::error::BotResult;

pub const ALIVE_BODY: &str = "Bot is alive!";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE_BODY }))
}

/// Bind `0.0.0.0:port` and serve until the process exits.
pub async fn serve(port: u16) -> BotResult<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("bind keep-alive port {port}"))?;
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> BotResult<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "keep-alive server listening");
    }
    axum::serve(listener, router())
        .await
        .context("keep-alive server")?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/keepalive.rs"]
mod tests;
