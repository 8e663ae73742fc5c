use std::io::Cursor;

use anyhow::Context;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::{
    assets::decode::unpremultiply_rgba8_in_place,
    foundation::error::{BotError, BotResult},
    render::animate::AnimatedRaster,
    render::surface::RasterFrame,
};

pub const PNG_MIME: &str = "image/png";
pub const GIF_MIME: &str = "image/gif";

fn to_straight_rgba(frame: &RasterFrame) -> BotResult<image::RgbaImage> {
    let mut data = frame.rgba8_premul.clone();
    unpremultiply_rgba8_in_place(&mut data);
    image::RgbaImage::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| BotError::render("frame byte length does not match its dimensions"))
}

/// Encode a raster as PNG.
pub fn encode_png(frame: &RasterFrame) -> BotResult<Vec<u8>> {
    let img = to_straight_rgba(frame)?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Encode frames as a looping GIF with a fixed `1 / fps` frame duration.
pub fn encode_gif(anim: &AnimatedRaster) -> BotResult<Vec<u8>> {
    if anim.frames.is_empty() {
        return Err(BotError::render("cannot encode an animation with no frames"));
    }
    let (numer, denom) = anim.fps.frame_delay_ms_ratio();
    let delay = image::Delay::from_numer_denom_ms(numer, denom);

    let frames = anim
        .frames
        .iter()
        .map(|f| Ok(image::Frame::from_parts(to_straight_rgba(f)?, 0, 0, delay)))
        .collect::<BotResult<Vec<_>>>()?;

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite).context("set gif repeat")?;
        encoder.encode_frames(frames).context("encode gif frames")?;
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
