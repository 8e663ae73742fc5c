use serde::{Deserialize, Serialize};

use crate::{
    assets::source::AssetRef,
    assets::store::AssetRequest,
    foundation::core::{Color, Fps},
    foundation::error::{BotError, BotResult},
};

/// Static vs. animated presentation of a template.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantKind {
    /// Single raster composed once.
    Static,
    /// Every frame of an animated background redrawn, output at `fps`.
    Animated { fps: Fps },
}

/// One interchangeable background + layout for a command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariant {
    pub variant_id: u32,
    pub kind: VariantKind,
    /// Background asset, relative to the template directory.
    pub asset_path: String,
    pub layout: LayoutSpec,
}

/// Ordered drawing instructions applied after the background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutSpec {
    pub placements: Vec<Placement>,
}

impl LayoutSpec {
    pub fn new(placements: Vec<Placement>) -> Self {
        Self { placements }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Image(ImagePlacement),
    Text(TextPlacement),
}

/// Which picture an image placement draws.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// A fixed overlay from the template directory.
    Asset(String),
    /// Avatar of the n-th subject (resolved targets, or the invoker for self-targeting commands).
    Subject(usize),
    /// Avatar of the invoking user.
    Invoker,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipCircle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub source: ImageSource,
    pub x: f64,
    pub y: f64,
    /// Drawn width; the image's natural width when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Drawn height; the image's natural height when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Rotation about the canvas origin, scoped to this placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_rad: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_circle: Option<ClipCircle>,
}

/// Which string a text placement draws.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Caption,
    SubjectName(usize),
    InvokerName,
    Literal(String),
}

/// How `x` of a text placement is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    /// `x` offsets the horizontally centered position.
    #[default]
    Centered,
    /// `x` is the left edge.
    Absolute,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Font file, relative to the template directory.
    pub asset: String,
    pub size_px: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextPlacement {
    pub source: TextSource,
    pub x: f64,
    /// Top edge of the text box.
    pub y: f64,
    #[serde(default)]
    pub anchor: TextAnchor,
    pub font: FontSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Wrap width; a single line when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f32>,
    #[serde(default)]
    pub uppercase: bool,
}

impl TextPlacement {
    /// Fill color to use, defaulting to white when neither fill nor stroke is set.
    pub fn effective_fill(&self) -> Option<Color> {
        match (self.fill_color, self.stroke_color) {
            (Some(c), _) => Some(c),
            (None, None) => Some(Color::WHITE),
            (None, Some(_)) => None,
        }
    }

    /// Stroke color and width, when a stroke pass is requested.
    pub fn effective_stroke(&self) -> Option<(Color, f64)> {
        self.stroke_color
            .map(|c| (c, self.stroke_width.unwrap_or(1.0)))
    }
}

impl TemplateVariant {
    /// Background asset reference.
    pub fn background(&self) -> AssetRef {
        AssetRef::local(self.asset_path.clone())
    }

    /// Template-directory assets this variant needs; avatars are requested separately.
    pub fn template_requests(&self) -> Vec<AssetRequest> {
        let mut out = Vec::with_capacity(self.layout.placements.len() + 1);
        out.push(match self.kind {
            VariantKind::Static => AssetRequest::image(self.background()),
            VariantKind::Animated { .. } => AssetRequest::animation(self.background()),
        });
        for p in &self.layout.placements {
            match p {
                Placement::Image(ImagePlacement {
                    source: ImageSource::Asset(path),
                    ..
                }) => out.push(AssetRequest::image(AssetRef::local(path.clone()))),
                Placement::Image(_) => {}
                Placement::Text(t) => {
                    out.push(AssetRequest::font(AssetRef::local(t.font.asset.clone())))
                }
            }
        }
        out
    }

    /// Number of distinct subjects this layout draws (highest `Subject`/`SubjectName` index + 1).
    pub fn subjects_used(&self) -> usize {
        self.layout
            .placements
            .iter()
            .filter_map(|p| match p {
                Placement::Image(ImagePlacement {
                    source: ImageSource::Subject(i),
                    ..
                })
                | Placement::Text(TextPlacement {
                    source: TextSource::SubjectName(i),
                    ..
                }) => Some(i + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> BotResult<()> {
        if self.asset_path.trim().is_empty() {
            return Err(BotError::validation(format!(
                "variant {} has an empty asset path",
                self.variant_id
            )));
        }
        for (i, p) in self.layout.placements.iter().enumerate() {
            validate_placement(p).map_err(|e| {
                BotError::validation(format!(
                    "variant {} placement {i}: {e}",
                    self.variant_id
                ))
            })?;
        }
        Ok(())
    }
}

fn validate_placement(p: &Placement) -> Result<(), String> {
    fn finite(name: &str, v: f64) -> Result<(), String> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(format!("{name} must be finite"))
        }
    }
    fn positive(name: &str, v: Option<f64>) -> Result<(), String> {
        match v {
            Some(v) if !(v.is_finite() && v > 0.0) => Err(format!("{name} must be finite and > 0")),
            _ => Ok(()),
        }
    }

    match p {
        Placement::Image(img) => {
            finite("x", img.x)?;
            finite("y", img.y)?;
            positive("width", img.width)?;
            positive("height", img.height)?;
            if let Some(r) = img.rotation_rad {
                finite("rotation_rad", r)?;
            }
            if let Some(c) = img.clip_circle {
                finite("clip_circle.cx", c.cx)?;
                finite("clip_circle.cy", c.cy)?;
                positive("clip_circle.r", Some(c.r))?;
            }
            Ok(())
        }
        Placement::Text(t) => {
            finite("x", t.x)?;
            finite("y", t.y)?;
            positive("font.size_px", Some(f64::from(t.font.size_px)))?;
            positive("stroke_width", t.stroke_width)?;
            positive("max_width", t.max_width.map(f64::from))?;
            if t.font.asset.trim().is_empty() {
                return Err("font.asset must be non-empty".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
