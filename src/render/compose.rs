use crate::{
    assets::source::AssetRef,
    assets::store::{PreparedAssetStore, PreparedImage, TextLayoutEngine},
    foundation::core::{Canvas, Point},
    foundation::error::{BotError, BotResult},
    render::surface::{DrawSurface, RasterFrame},
    template::model::{
        ImagePlacement, ImageSource, Placement, TextAnchor, TextPlacement, TextSource,
    },
};

/// Per-invocation content a layout's logical roles resolve to.
#[derive(Clone, Debug, Default)]
pub struct LayoutBindings {
    pub caption: String,
    /// Subjects in layout order: resolved targets, or the invoker for self-targeting commands.
    pub subjects: Vec<SubjectBinding>,
    pub invoker: SubjectBinding,
}

#[derive(Clone, Debug, Default)]
pub struct SubjectBinding {
    pub display_name: String,
    /// Prepared avatar; `None` draws a transparent placeholder.
    pub avatar: Option<AssetRef>,
}

/// Draws [`Placement`]s onto a surface from a prepared asset store.
pub struct LayoutPainter<'a> {
    store: &'a PreparedAssetStore,
    bindings: &'a LayoutBindings,
    text: TextLayoutEngine,
    placeholder: PreparedImage,
}

impl<'a> LayoutPainter<'a> {
    pub fn new(store: &'a PreparedAssetStore, bindings: &'a LayoutBindings) -> Self {
        Self {
            store,
            bindings,
            text: TextLayoutEngine::new(),
            placeholder: PreparedImage::transparent_placeholder(),
        }
    }

    pub fn paint_all(
        &mut self,
        surface: &mut DrawSurface,
        placements: &[Placement],
    ) -> BotResult<()> {
        placements.iter().try_for_each(|p| self.paint(surface, p))
    }

    pub fn paint(&mut self, surface: &mut DrawSurface, placement: &Placement) -> BotResult<()> {
        match placement {
            Placement::Image(img) => self.paint_image(surface, img),
            Placement::Text(text) => self.paint_text(surface, text),
        }
    }

    fn paint_image(&mut self, surface: &mut DrawSurface, p: &ImagePlacement) -> BotResult<()> {
        let image = self.image_for(&p.source)?;
        let width = p.width.unwrap_or(f64::from(image.width));
        let height = p.height.unwrap_or(f64::from(image.height));

        let mut cp = surface.checkpoint();
        if let Some(r) = p.rotation_rad {
            cp.rotate(r);
        }
        if let Some(clip) = p.clip_circle {
            cp.clip_circle(clip);
        }
        cp.draw_image(image, p.x, p.y, width, height)
    }

    fn image_for(&self, source: &ImageSource) -> BotResult<&PreparedImage> {
        let avatar = match source {
            ImageSource::Asset(path) => return self.store.image(&AssetRef::local(path.clone())),
            ImageSource::Subject(i) => {
                &self
                    .bindings
                    .subjects
                    .get(*i)
                    .ok_or_else(|| BotError::validation(format!("layout uses unbound subject {i}")))?
                    .avatar
            }
            ImageSource::Invoker => &self.bindings.invoker.avatar,
        };
        match avatar {
            Some(asset) => self.store.image(asset),
            None => Ok(&self.placeholder),
        }
    }

    fn text_for(&self, source: &TextSource) -> BotResult<String> {
        Ok(match source {
            TextSource::Caption => self.bindings.caption.clone(),
            TextSource::SubjectName(i) => self
                .bindings
                .subjects
                .get(*i)
                .ok_or_else(|| BotError::validation(format!("layout uses unbound subject {i}")))?
                .display_name
                .clone(),
            TextSource::InvokerName => self.bindings.invoker.display_name.clone(),
            TextSource::Literal(s) => s.clone(),
        })
    }

    fn paint_text(&mut self, surface: &mut DrawSurface, p: &TextPlacement) -> BotResult<()> {
        let raw = self.text_for(&p.source)?;
        if raw.trim().is_empty() {
            return Ok(());
        }
        let text = if p.uppercase { raw.to_uppercase() } else { raw };

        let font = self.store.font(&AssetRef::local(p.font.asset.clone()))?;
        let layout = self
            .text
            .layout_plain(&text, font, p.font.size_px, p.max_width)?;

        let x = match p.anchor {
            TextAnchor::Centered => {
                (f64::from(surface.canvas().width) - f64::from(layout.width())) / 2.0 + p.x
            }
            TextAnchor::Absolute => p.x,
        };
        surface.draw_text(
            &layout,
            font,
            Point::new(x, p.y),
            p.effective_fill(),
            p.effective_stroke(),
        );
        Ok(())
    }
}

/// Compose a static image: the background stretched over a canvas of its own size, then each
/// placement in order.
pub fn compose_static(
    background: &PreparedImage,
    placements: &[Placement],
    painter: &mut LayoutPainter<'_>,
) -> BotResult<RasterFrame> {
    let canvas = Canvas::new(background.width, background.height)?;
    let mut surface = DrawSurface::new(canvas)?;
    surface.draw_background(background)?;
    painter.paint_all(&mut surface, placements)?;
    Ok(surface.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
