use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;

use crate::foundation::error::{BotError, BotResult};

/// Capability to load raw bytes for a location.
///
/// Implementations never decode; decoding is done by [`crate::assets::decode`].
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Load the bytes stored at `location`.
    async fn fetch(&self, location: &str) -> BotResult<Vec<u8>>;
}

/// Reads template assets from a fixed directory.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ByteSource for FsSource {
    async fn fetch(&self, location: &str) -> BotResult<Vec<u8>> {
        let norm = normalize_rel_path(location)?;
        let path = self.root.join(Path::new(&norm));
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(|e| BotError::asset_load(format!("{e:#}")))
    }
}

/// Fetches remote assets (user avatars) over HTTP.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn fetch(&self, location: &str) -> BotResult<Vec<u8>> {
        let resp = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| BotError::asset_load(format!("fetch '{location}': {e}")))?;

        if !resp.status().is_success() {
            return Err(BotError::asset_load(format!(
                "fetch '{location}': status {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BotError::asset_load(format!("read body of '{location}': {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Serves bytes registered up front, keyed by exact location.
///
/// Used for offline rendering where avatars come from local files instead of a CDN.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(location, bytes);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(location.into(), Arc::new(bytes));
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn fetch(&self, location: &str) -> BotResult<Vec<u8>> {
        self.files
            .get(location)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| BotError::asset_load(format!("no asset registered at '{location}'")))
    }
}

/// Where an asset lives. The caller picks the variant; locations are never sniffed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetRef {
    /// Path relative to the template asset directory.
    Local(String),
    /// Absolute URL fetched over HTTP.
    Remote(String),
}

impl AssetRef {
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local(path.into())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }

    pub fn location(&self) -> &str {
        match self {
            Self::Local(p) => p,
            Self::Remote(u) => u,
        }
    }
}

/// The pair of byte sources an invocation loads from.
#[derive(Clone)]
pub struct AssetSources {
    pub local: Arc<dyn ByteSource>,
    pub remote: Arc<dyn ByteSource>,
}

impl AssetSources {
    pub fn new(local: Arc<dyn ByteSource>, remote: Arc<dyn ByteSource>) -> Self {
        Self { local, remote }
    }

    /// Filesystem templates under `root`, avatars over HTTP.
    pub fn standard(root: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            local: Arc::new(FsSource::new(root)),
            remote: Arc::new(HttpSource::new(client)),
        }
    }

    pub async fn fetch(&self, asset: &AssetRef) -> BotResult<Vec<u8>> {
        match asset {
            AssetRef::Local(p) => self.local.fetch(p).await,
            AssetRef::Remote(u) => self.remote.fetch(u).await,
        }
    }
}

impl std::fmt::Debug for AssetSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetSources").finish_non_exhaustive()
    }
}

/// Normalize and validate asset-directory-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> BotResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(BotError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(BotError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BotError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BotError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
