//! Text overlays composited onto stored images.
//!
//! Each [`TextOverlay`] renders to its own RGBA buffer, gets a position
//! (its own, else the request default, else centre), and all buffers are
//! painted onto the decoded image in one pass. The result is re-encoded in
//! the file's detected format and written back to the same path, so the
//! file name never changes here.
//!
//! ```yaml
//! - text: "© Example"
//!   style: { font_size: 18, color: "#FFFFFF", opacity: 0.6 }
//!   position: southeast
//! - text: "DRAFT"
//!   position: { x: 10, y: 10 }
//! ```

pub mod compositor;
pub mod position;
pub mod text_renderer;

pub use compositor::{Compositor, OverlayLayer};
pub use position::{
    calculate_position, Gravity, ImageDimensions, OverlayDimensions, OverlayPosition,
    PlacementPosition,
};
pub use text_renderer::{measure_text, parse_hex_color, render_text, Color, TextRenderOptions};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE};
use crate::error::SaverError;
use crate::target::SaveTarget;
use crate::transform::{decode_image, encode_dynamic, EncoderQuality, ImageError, ImageFormat};

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_opacity() -> f32 {
    1.0
}

/// Visual style of a text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in pixels (default: 24)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Text color as hex string (default: "#000000")
    #[serde(default = "default_color")]
    pub color: String,

    /// Opacity from 0.0 to 1.0 (default: 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Clockwise rotation in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f32>,

    /// Opaque background color as hex string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            color: default_color(),
            opacity: default_opacity(),
            rotation_degrees: None,
            background: None,
        }
    }
}

impl TextStyle {
    /// Validate the style before anything is rendered.
    pub fn validate(&self) -> Result<(), ImageError> {
        if !self.font_size.is_finite() || !(self.font_size > 0.0 && self.font_size <= MAX_FONT_SIZE)
        {
            return Err(ImageError::invalid_param(
                "font_size",
                format!(
                    "must be a finite value in (0, {}], got {}",
                    MAX_FONT_SIZE, self.font_size
                ),
            ));
        }

        // Check for NaN/Infinity and valid range
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(ImageError::invalid_param(
                "opacity",
                format!("must be a finite value between 0.0 and 1.0, got {}", self.opacity),
            ));
        }

        if let Some(degrees) = self.rotation_degrees {
            if !degrees.is_finite() {
                return Err(ImageError::invalid_param(
                    "rotation_degrees",
                    format!("must be finite, got {}", degrees),
                ));
            }
        }

        Ok(())
    }
}

/// One caption to paint onto the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,

    /// Overrides the request-level default position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<OverlayPosition>,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
            position: None,
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn at(mut self, position: impl Into<OverlayPosition>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Convert to renderer options, parsing the hex colors.
    pub fn render_options(&self) -> Result<TextRenderOptions, ImageError> {
        let style = self.style.clone().unwrap_or_default();
        style.validate()?;
        Ok(TextRenderOptions {
            text: self.text.clone(),
            font_size: style.font_size,
            color: parse_hex_color(&style.color)?,
            opacity: style.opacity,
            rotation_degrees: style.rotation_degrees,
            background: style.background.as_deref().map(parse_hex_color).transpose()?,
        })
    }
}

/// Composite `overlays` onto encoded image bytes.
///
/// Output keeps the input's encoded format.
pub fn composite_bytes(
    data: &[u8],
    overlays: &[TextOverlay],
    default_position: Option<OverlayPosition>,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let format = ImageFormat::detect(data)
        .ok_or_else(|| ImageError::unsupported_format("unrecognized image data"))?;
    let base = decode_image(data)?;
    let dims = ImageDimensions {
        width: base.width(),
        height: base.height(),
    };

    let mut compositor = Compositor::new();
    for overlay in overlays {
        let rendered = render_text(&overlay.render_options()?)?;
        let position = overlay.position.or(default_position).unwrap_or_default();
        compositor.add_layer(OverlayLayer::positioned(rendered, &dims, &position)?);
    }

    let composited = compositor.apply_to_dynamic(&base);
    Ok(encode_dynamic(&composited, format, EncoderQuality::with_quality(quality))?.data)
}

/// Composite `overlays` onto the file behind `target`, in place.
pub async fn composite_file(
    target: &SaveTarget,
    overlays: &[TextOverlay],
    default_position: Option<OverlayPosition>,
    quality: u8,
) -> Result<(), SaverError> {
    let path = target
        .path()
        .ok_or(SaverError::RequiredArgumentMissing("file_name"))?
        .to_path_buf();

    let data = tokio::fs::read(&path).await?;
    let overlays = overlays.to_vec();
    let count = overlays.len();

    let output = tokio::task::spawn_blocking(move || {
        composite_bytes(&data, &overlays, default_position, quality)
    })
    .await
    .map_err(ImageError::from)??;

    tokio::fs::write(&path, output).await?;

    debug!(path = %path.display(), overlays = count, "Overlays composited");
    Ok(())
}
