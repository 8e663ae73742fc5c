use std::{io::Cursor, sync::Arc};

use anyhow::Context;
use image::AnimationDecoder;

use crate::{
    assets::store::{PreparedAnimation, PreparedFrame, PreparedImage},
    foundation::error::{BotError, BotResult},
};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> BotResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(BotError::asset_load("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode an animated GIF into its full-canvas frames, in display order.
pub fn decode_animation(bytes: &[u8]) -> BotResult<PreparedAnimation> {
    let format = image::guess_format(bytes).context("detect animation format")?;
    if format != image::ImageFormat::Gif {
        return Err(BotError::asset_load(format!(
            "unsupported animation format {format:?}; expected GIF"
        )));
    }

    let decoder =
        image::codecs::gif::GifDecoder::new(Cursor::new(bytes)).context("open gif decoder")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("decode gif frames")?;
    if frames.is_empty() {
        return Err(BotError::asset_load("animation has no frames"));
    }

    let mut out = Vec::with_capacity(frames.len());
    let (mut width, mut height) = (0, 0);
    for frame in frames {
        let (numer, denom) = frame.delay().numer_denom_ms();
        let rgba = frame.into_buffer();
        let (w, h) = rgba.dimensions();
        if out.is_empty() {
            (width, height) = (w, h);
        } else if (w, h) != (width, height) {
            return Err(BotError::asset_load("animation frames differ in size"));
        }

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        out.push(PreparedFrame {
            image: PreparedImage {
                width: w,
                height: h,
                rgba8_premul: Arc::new(rgba8_premul),
            },
            delay_ms: if denom == 0 { 0 } else { numer / denom },
        });
    }

    if width == 0 || height == 0 {
        return Err(BotError::asset_load("animation has zero size"));
    }

    Ok(PreparedAnimation {
        width,
        height,
        frames: out,
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
