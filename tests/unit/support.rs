//! Shared fixtures for unit tests.

use std::{io::Cursor, path::PathBuf, sync::Arc};

use crate::assets::source::{AssetSources, MemorySource};

pub(crate) fn solid_rgba(w: u32, h: u32, px: [u8; 4]) -> image::RgbaImage {
    image::RgbaImage::from_fn(w, h, |_, _| image::Rgba(px))
}

pub(crate) fn png_bytes(img: &image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub(crate) fn solid_png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    png_bytes(&solid_rgba(w, h, px))
}

/// Encode one opaque solid-color frame per entry of `colors`.
pub(crate) fn solid_gif(w: u32, h: u32, colors: &[[u8; 4]]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = image::codecs::gif::GifEncoder::new(&mut buf);
        let frames = colors.iter().map(|c| {
            image::Frame::from_parts(
                solid_rgba(w, h, *c),
                0,
                0,
                image::Delay::from_numer_denom_ms(100, 1),
            )
        });
        enc.encode_frames(frames).unwrap();
    }
    buf
}

pub(crate) fn font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans-Bold.ttf")
}

pub(crate) fn font_bytes() -> Option<Vec<u8>> {
    std::fs::read(font_path()).ok()
}

pub(crate) fn mem_sources(local: MemorySource, remote: MemorySource) -> AssetSources {
    AssetSources::new(Arc::new(local), Arc::new(remote))
}

/// Reply sink that records everything it is asked to deliver.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub replies: std::sync::Mutex<Vec<crate::dispatch::reply::Reply>>,
}

impl RecordingSink {
    pub(crate) fn take(&self) -> Vec<crate::dispatch::reply::Reply> {
        std::mem::take(&mut *self.replies.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl crate::dispatch::reply::ReplySink for RecordingSink {
    async fn send(
        &self,
        reply: crate::dispatch::reply::Reply,
    ) -> crate::foundation::error::BotResult<()> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

pub(crate) fn user(id: &str, name: &str) -> crate::dispatch::args::UserRef {
    crate::dispatch::args::UserRef::new(id, name, name.to_lowercase())
}

pub(crate) fn inbound(text: &str, author: crate::dispatch::args::UserRef) -> crate::dispatch::router::InboundMessage {
    crate::dispatch::router::InboundMessage {
        raw_text: text.to_string(),
        mentioned_users: Vec::new(),
        author,
        author_is_self: false,
        author_is_bot: false,
        known_users: crate::dispatch::args::UserDirectory::new(),
    }
}
