use crate::{
    assets::store::PreparedAnimation,
    foundation::core::{Canvas, Fps},
    foundation::error::{BotError, BotResult},
    render::compose::LayoutPainter,
    render::surface::{DrawSurface, RasterFrame},
    template::model::Placement,
};

/// Re-drawn frame sequence, played back at `fps` regardless of source timing.
#[derive(Clone, Debug)]
pub struct AnimatedRaster {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub frames: Vec<RasterFrame>,
}

/// Drawing context handed to the per-frame callback, already holding the source frame.
pub struct FrameContext<'a> {
    pub surface: &'a mut DrawSurface,
    pub index: usize,
    pub frame_count: usize,
}

/// Redraw every frame of `source`: the frame itself, then whatever `draw` adds on top.
///
/// Every source frame appears in the output, in order.
#[tracing::instrument(level = "debug", skip_all, fields(frames = source.frames.len()))]
pub fn compose_animated(
    source: &PreparedAnimation,
    fps: Fps,
    mut draw: impl FnMut(&mut FrameContext<'_>) -> BotResult<()>,
) -> BotResult<AnimatedRaster> {
    if source.frames.is_empty() {
        return Err(BotError::asset_load("animation has no frames"));
    }

    let canvas = Canvas::new(source.width, source.height)?;
    let mut surface = DrawSurface::new(canvas)?;
    let frame_count = source.frames.len();
    let mut frames = Vec::with_capacity(frame_count);

    for (index, frame) in source.frames.iter().enumerate() {
        surface.draw_background(&frame.image)?;
        draw(&mut FrameContext {
            surface: &mut surface,
            index,
            frame_count,
        })?;
        frames.push(surface.take_frame());
    }

    Ok(AnimatedRaster {
        width: source.width,
        height: source.height,
        fps,
        frames,
    })
}

/// [`compose_animated`] with the same placements painted on every frame.
pub fn compose_animated_layout(
    source: &PreparedAnimation,
    fps: Fps,
    placements: &[Placement],
    painter: &mut LayoutPainter<'_>,
) -> BotResult<AnimatedRaster> {
    compose_animated(source, fps, |frame| {
        painter.paint_all(frame.surface, placements)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/animate.rs"]
mod tests;
