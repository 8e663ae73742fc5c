use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use vello_cpu::kurbo::Shape;

use crate::{
    assets::store::{PreparedFont, PreparedImage, TextBrush},
    foundation::core::{Affine, Canvas, Color, Point},
    foundation::error::{BotError, BotResult},
    template::model::ClipCircle,
};

/// Finished raster in premultiplied RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// CPU drawing target for one output image.
///
/// Transform and clip state only change through [`GraphicsCheckpoint`], so every drawing call
/// made directly on the surface sees the untransformed, unclipped canvas.
pub struct DrawSurface {
    canvas: Canvas,
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    transform: Affine,
    clip_depth: usize,
    image_cache: HashMap<usize, vello_cpu::Image>,
    font_cache: HashMap<usize, vello_cpu::peniko::FontData>,
}

impl DrawSurface {
    pub fn new(canvas: Canvas) -> BotResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| BotError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| BotError::render("canvas height exceeds u16"))?;
        Ok(Self {
            canvas,
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            transform: Affine::IDENTITY,
            clip_depth: 0,
            image_cache: HashMap::new(),
            font_cache: HashMap::new(),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Current user-space transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Number of clip layers currently active.
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    /// Save transform and clip state; both are restored when the checkpoint drops.
    pub fn checkpoint(&mut self) -> GraphicsCheckpoint<'_> {
        GraphicsCheckpoint {
            saved_transform: self.transform,
            saved_clip_depth: self.clip_depth,
            surface: self,
        }
    }

    /// Draw `image` stretched over the full canvas.
    pub fn draw_background(&mut self, image: &PreparedImage) -> BotResult<()> {
        let paint = image_paint(image)?;
        let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        self.fill_with_image(paint, image, (0.0, 0.0, w, h));
        Ok(())
    }

    /// Draw `image` scaled into the box `(x, y, width, height)` under the current transform.
    pub fn draw_image(
        &mut self,
        image: &PreparedImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> BotResult<()> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        let paint = match self.image_cache.get(&key) {
            Some(p) => p.clone(),
            None => {
                let p = image_paint(image)?;
                self.image_cache.insert(key, p.clone());
                p
            }
        };
        self.fill_with_image(paint, image, (x, y, width, height));
        Ok(())
    }

    fn fill_with_image(
        &mut self,
        paint: vello_cpu::Image,
        image: &PreparedImage,
        (x, y, width, height): (f64, f64, f64, f64),
    ) {
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let placed = self.transform
            * Affine::translate((x, y))
            * Affine::scale_non_uniform(width / iw, height / ih);

        self.ctx.set_transform(affine_to_cpu(placed));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    }

    /// Draw a laid-out text block with its top-left corner at `origin`.
    ///
    /// The stroke pass runs before the fill pass so the fill never hides the outline.
    pub fn draw_text(
        &mut self,
        layout: &parley::Layout<TextBrush>,
        font: &PreparedFont,
        origin: Point,
        fill: Option<Color>,
        stroke: Option<(Color, f64)>,
    ) {
        let font = self.font_data(font);
        let placed = self.transform * Affine::translate(origin.to_vec2());
        self.ctx.set_transform(affine_to_cpu(placed));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some((color, width)) = stroke {
            self.ctx.set_paint(cpu_color(color));
            self.ctx
                .set_stroke(vello_cpu::kurbo::Stroke::new(width));
            for_each_run(layout, |size, glyphs| {
                self.ctx
                    .glyph_run(&font)
                    .font_size(size)
                    .stroke_glyphs(glyphs.into_iter());
            });
        }
        if let Some(color) = fill {
            self.ctx.set_paint(cpu_color(color));
            for_each_run(layout, |size, glyphs| {
                self.ctx
                    .glyph_run(&font)
                    .font_size(size)
                    .fill_glyphs(glyphs.into_iter());
            });
        }
    }

    fn font_data(&mut self, font: &PreparedFont) -> vello_cpu::peniko::FontData {
        let key = Arc::as_ptr(&font.bytes) as usize;
        self.font_cache
            .entry(key)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                    0,
                )
            })
            .clone()
    }

    fn push_clip_circle(&mut self, clip: ClipCircle) {
        let circle = vello_cpu::kurbo::Circle::new((clip.cx, clip.cy), clip.r);
        self.ctx.set_transform(affine_to_cpu(self.transform));
        self.ctx.push_clip_layer(&circle.to_path(0.1));
        self.clip_depth += 1;
    }

    fn pop_clip(&mut self) {
        self.ctx.pop_layer();
        self.clip_depth -= 1;
    }

    /// Rasterize everything drawn so far and start over on a clean canvas.
    ///
    /// Image and font paints stay cached, so one surface can render a whole frame sequence.
    pub fn take_frame(&mut self) -> RasterFrame {
        while self.clip_depth > 0 {
            self.pop_clip();
        }
        self.transform = Affine::IDENTITY;

        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);

        RasterFrame {
            width: self.canvas.width,
            height: self.canvas.height,
            rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
        }
    }

    /// Rasterize and consume the surface.
    pub fn finish(mut self) -> RasterFrame {
        self.take_frame()
    }
}

/// Scoped save of a surface's transform and clip state.
///
/// Rotations, translations and clips applied through the checkpoint are undone on drop, on every
/// exit path including `?`.
pub struct GraphicsCheckpoint<'a> {
    surface: &'a mut DrawSurface,
    saved_transform: Affine,
    saved_clip_depth: usize,
}

impl GraphicsCheckpoint<'_> {
    /// Rotate subsequent drawing by `radians` about the current origin.
    pub fn rotate(&mut self, radians: f64) -> &mut Self {
        self.surface.transform = self.surface.transform * Affine::rotate(radians);
        self
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.surface.transform = self.surface.transform * Affine::translate((x, y));
        self
    }

    /// Intersect the drawable region with a circle in current user space.
    pub fn clip_circle(&mut self, clip: ClipCircle) -> &mut Self {
        self.surface.push_clip_circle(clip);
        self
    }
}

impl Deref for GraphicsCheckpoint<'_> {
    type Target = DrawSurface;

    fn deref(&self) -> &DrawSurface {
        self.surface
    }
}

impl DerefMut for GraphicsCheckpoint<'_> {
    fn deref_mut(&mut self) -> &mut DrawSurface {
        self.surface
    }
}

impl Drop for GraphicsCheckpoint<'_> {
    fn drop(&mut self) {
        while self.surface.clip_depth > self.saved_clip_depth {
            self.surface.pop_clip();
        }
        self.surface.transform = self.saved_transform;
    }
}

fn for_each_run(
    layout: &parley::Layout<TextBrush>,
    mut draw: impl FnMut(f32, Vec<vello_cpu::Glyph>),
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run
                .positioned_glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
                .collect();
            draw(run.run().font_size(), glyphs);
        }
    }
}

fn image_paint(image: &PreparedImage) -> BotResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> BotResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BotError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BotError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(BotError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect::<Vec<_>>();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
