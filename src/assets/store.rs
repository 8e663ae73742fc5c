use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use futures::future::try_join_all;

use crate::{
    assets::decode as assets_decode,
    assets::source::{AssetRef, AssetSources},
    foundation::error::{BotError, BotResult},
};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// A 1x1 fully transparent image, drawn in place of avatars that have no URL.
    pub fn transparent_placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![0, 0, 0, 0]),
        }
    }
}

#[derive(Clone, Debug)]
/// One decoded frame of an animation.
pub struct PreparedFrame {
    /// Full-canvas frame pixels.
    pub image: PreparedImage,
    /// Source display duration in milliseconds.
    pub delay_ms: u32,
}

#[derive(Clone, Debug)]
/// Decoded animation: every frame at the same canvas size, in display order.
pub struct PreparedAnimation {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames in display order. Never empty.
    pub frames: Vec<PreparedFrame>,
}

#[derive(Clone)]
/// Raw font file bytes, shaped on demand by [`TextLayoutEngine`].
pub struct PreparedFont {
    /// Original font bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for PreparedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedFont")
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[derive(Clone, Debug)]
/// Union of all prepared asset kinds consumed by the composers.
pub enum PreparedAsset {
    /// Prepared bitmap image.
    Image(PreparedImage),
    /// Prepared animation frames.
    Animation(PreparedAnimation),
    /// Prepared font bytes.
    Font(PreparedFont),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// How fetched bytes should be decoded.
pub enum AssetKind {
    /// Static raster (any format the `image` crate decodes).
    Image,
    /// Animated GIF.
    Animation,
    /// TrueType/OpenType font file.
    Font,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// One asset an invocation needs before composition can begin.
pub struct AssetRequest {
    /// Where to fetch from.
    pub asset: AssetRef,
    /// How to decode.
    pub kind: AssetKind,
}

impl AssetRequest {
    /// Request a static image.
    pub fn image(asset: AssetRef) -> Self {
        Self {
            asset,
            kind: AssetKind::Image,
        }
    }

    /// Request an animation.
    pub fn animation(asset: AssetRef) -> Self {
        Self {
            asset,
            kind: AssetKind::Animation,
        }
    }

    /// Request a font.
    pub fn font(asset: AssetRef) -> Self {
        Self {
            asset,
            kind: AssetKind::Font,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Immutable per-invocation store of decoded assets.
///
/// All IO happens in [`PreparedAssetStore::prepare`]; composers only read from the store.
/// A store is never shared between invocations.
pub struct PreparedAssetStore {
    assets: HashMap<AssetRef, PreparedAsset>,
}

impl PreparedAssetStore {
    /// Fetch and decode every request concurrently; duplicate requests are loaded once.
    ///
    /// The first failed fetch or decode fails the whole preparation.
    #[tracing::instrument(level = "debug", skip_all, fields(requests = requests.len()))]
    pub async fn prepare(requests: &[AssetRequest], sources: &AssetSources) -> BotResult<Self> {
        let unique: BTreeSet<&AssetRequest> = requests.iter().collect();

        let loads = unique.into_iter().map(|req| async move {
            let bytes = sources.fetch(&req.asset).await?;
            let prepared = decode_request(req, &bytes)?;
            tracing::debug!(
                target: "assets",
                location = req.asset.location(),
                kind = ?req.kind,
                bytes = bytes.len(),
                "asset prepared"
            );
            Ok::<_, BotError>((req.asset.clone(), prepared))
        });

        let loaded = try_join_all(loads).await?;
        Ok(Self {
            assets: loaded.into_iter().collect(),
        })
    }

    /// Add an already-decoded asset.
    pub fn insert(&mut self, asset: AssetRef, prepared: PreparedAsset) {
        self.assets.insert(asset, prepared);
    }

    /// Number of distinct prepared assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the store holds no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Lookup prepared asset data by reference.
    pub fn get(&self, asset: &AssetRef) -> BotResult<&PreparedAsset> {
        self.assets.get(asset).ok_or_else(|| {
            BotError::asset_load(format!("asset '{}' was not prepared", asset.location()))
        })
    }

    /// Lookup a prepared static image.
    pub fn image(&self, asset: &AssetRef) -> BotResult<&PreparedImage> {
        match self.get(asset)? {
            PreparedAsset::Image(img) => Ok(img),
            _ => Err(BotError::validation(format!(
                "asset '{}' is not an image",
                asset.location()
            ))),
        }
    }

    /// Lookup a prepared animation.
    pub fn animation(&self, asset: &AssetRef) -> BotResult<&PreparedAnimation> {
        match self.get(asset)? {
            PreparedAsset::Animation(anim) => Ok(anim),
            _ => Err(BotError::validation(format!(
                "asset '{}' is not an animation",
                asset.location()
            ))),
        }
    }

    /// Lookup a prepared font.
    pub fn font(&self, asset: &AssetRef) -> BotResult<&PreparedFont> {
        match self.get(asset)? {
            PreparedAsset::Font(font) => Ok(font),
            _ => Err(BotError::validation(format!(
                "asset '{}' is not a font",
                asset.location()
            ))),
        }
    }
}

fn decode_request(req: &AssetRequest, bytes: &[u8]) -> BotResult<PreparedAsset> {
    let decoded = match req.kind {
        AssetKind::Image => assets_decode::decode_image(bytes).map(PreparedAsset::Image),
        AssetKind::Animation => {
            assets_decode::decode_animation(bytes).map(PreparedAsset::Animation)
        }
        AssetKind::Font => {
            if bytes.is_empty() {
                Err(BotError::asset_load("font file is empty"))
            } else {
                Ok(PreparedAsset::Font(PreparedFont {
                    bytes: Arc::new(bytes.to_vec()),
                }))
            }
        }
    };

    decoded.map_err(|e| match e {
        BotError::Other(inner) => BotError::asset_load(format!(
            "decode '{}': {inner:#}",
            req.asset.location()
        )),
        other => other,
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrush {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    families: HashMap<usize, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Shape and lay out plain text using provided font bytes.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font: &PreparedFont,
        size_px: f32,
        max_width_px: Option<f32>,
    ) -> BotResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(BotError::validation("text size_px must be finite and > 0"));
        }

        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::default()));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }

    // Fonts are keyed by their backing allocation so each file is registered once.
    fn family_for(&mut self, font: &PreparedFont) -> BotResult<String> {
        let key = Arc::as_ptr(&font.bytes) as usize;
        if let Some(name) = self.families.get(&key) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| BotError::asset_load("no font families registered from font bytes"))?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| BotError::asset_load("registered font family has no name"))?
            .to_string();
        self.families.insert(key, family_name.clone());
        Ok(family_name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
