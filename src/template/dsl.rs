//! Builders for declaring template variants in code.

use crate::{
    foundation::core::{Color, Fps},
    template::model::{
        ClipCircle, FontSpec, ImagePlacement, ImageSource, LayoutSpec, Placement, TemplateVariant,
        TextAnchor, TextPlacement, TextSource, VariantKind,
    },
};

pub fn static_variant(
    variant_id: u32,
    asset_path: impl Into<String>,
    placements: Vec<Placement>,
) -> TemplateVariant {
    TemplateVariant {
        variant_id,
        kind: VariantKind::Static,
        asset_path: asset_path.into(),
        layout: LayoutSpec::new(placements),
    }
}

pub fn animated_variant(
    variant_id: u32,
    asset_path: impl Into<String>,
    fps: Fps,
    placements: Vec<Placement>,
) -> TemplateVariant {
    TemplateVariant {
        variant_id,
        kind: VariantKind::Animated { fps },
        asset_path: asset_path.into(),
        layout: LayoutSpec::new(placements),
    }
}

/// Avatar of the n-th subject at `(x, y)`, sized `size` x `size`.
pub fn avatar(subject: usize, x: f64, y: f64, size: f64) -> ImageBuilder {
    image(ImageSource::Subject(subject), x, y).size(size, size)
}

/// Avatar of the invoking user at `(x, y)`, sized `size` x `size`.
pub fn invoker_avatar(x: f64, y: f64, size: f64) -> ImageBuilder {
    image(ImageSource::Invoker, x, y).size(size, size)
}

pub fn image(source: ImageSource, x: f64, y: f64) -> ImageBuilder {
    ImageBuilder {
        inner: ImagePlacement {
            source,
            x,
            y,
            width: None,
            height: None,
            rotation_rad: None,
            clip_circle: None,
        },
    }
}

#[derive(Clone, Debug)]
pub struct ImageBuilder {
    inner: ImagePlacement,
}

impl ImageBuilder {
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.inner.width = Some(width);
        self.inner.height = Some(height);
        self
    }

    pub fn rotate(mut self, radians: f64) -> Self {
        self.inner.rotation_rad = Some(radians);
        self
    }

    pub fn clip_circle(mut self, cx: f64, cy: f64, r: f64) -> Self {
        self.inner.clip_circle = Some(ClipCircle { cx, cy, r });
        self
    }

    /// Clip to the circle inscribed in the placement's box.
    pub fn round(self) -> Self {
        let w = self.inner.width.unwrap_or(0.0);
        let h = self.inner.height.unwrap_or(0.0);
        let (cx, cy) = (self.inner.x + w / 2.0, self.inner.y + h / 2.0);
        self.clip_circle(cx, cy, w.min(h) / 2.0)
    }

    pub fn build(self) -> Placement {
        Placement::Image(self.inner)
    }
}

pub fn text(source: TextSource, font: &str, size_px: f32, x: f64, y: f64) -> TextBuilder {
    TextBuilder {
        inner: TextPlacement {
            source,
            x,
            y,
            anchor: TextAnchor::Centered,
            font: FontSpec {
                asset: font.to_string(),
                size_px,
            },
            fill_color: None,
            stroke_color: None,
            stroke_width: None,
            max_width: None,
            uppercase: false,
        },
    }
}

#[derive(Clone, Debug)]
pub struct TextBuilder {
    inner: TextPlacement,
}

impl TextBuilder {
    pub fn fill(mut self, color: Color) -> Self {
        self.inner.fill_color = Some(color);
        self
    }

    pub fn stroke(mut self, color: Color, width: f64) -> Self {
        self.inner.stroke_color = Some(color);
        self.inner.stroke_width = Some(width);
        self
    }

    pub fn absolute(mut self) -> Self {
        self.inner.anchor = TextAnchor::Absolute;
        self
    }

    pub fn max_width(mut self, width: f32) -> Self {
        self.inner.max_width = Some(width);
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.inner.uppercase = true;
        self
    }

    pub fn build(self) -> Placement {
        Placement::Text(self.inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/dsl.rs"]
mod tests;
