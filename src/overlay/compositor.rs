//! Alpha compositing of rendered overlays onto the stored image.
//!
//! Layers paint in the order they were added: the first layer ends up at the
//! bottom and later layers cover it where they overlap. Parts of a layer that
//! fall outside the image are clipped.

use image::{DynamicImage, Rgba, RgbaImage};

use super::position::{ImageDimensions, OverlayDimensions, OverlayPosition, PlacementPosition};
use crate::transform::ImageError;

/// A rendered overlay pinned to a position on the target image.
#[derive(Clone)]
pub struct OverlayLayer {
    pub image: RgbaImage,
    pub position: PlacementPosition,
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .finish()
    }
}

impl OverlayLayer {
    /// Resolve `position` for `image` against a target of `target` size.
    pub fn positioned(
        image: RgbaImage,
        target: &ImageDimensions,
        position: &OverlayPosition,
    ) -> Result<Self, ImageError> {
        let dims = OverlayDimensions {
            width: image.width(),
            height: image.height(),
        };
        let position = position.resolve(target, &dims)?;
        Ok(Self { image, position })
    }
}

#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<OverlayLayer>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: OverlayLayer) {
        self.layers.push(layer);
    }

    /// Paint every layer onto `target` in insertion order.
    pub fn apply(&self, target: &mut RgbaImage) {
        for layer in &self.layers {
            blend_layer(target, layer);
        }
    }

    pub fn apply_to_dynamic(&self, target: &DynamicImage) -> DynamicImage {
        let mut rgba = target.to_rgba8();
        self.apply(&mut rgba);
        DynamicImage::ImageRgba8(rgba)
    }
}

fn blend_layer(target: &mut RgbaImage, layer: &OverlayLayer) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    // Visible region, clamped to target bounds
    let x_start = layer.position.x.max(0);
    let y_start = layer.position.y.max(0);
    let x_end = (layer.position.x + layer.image.width() as i32).min(target_width);
    let y_end = (layer.position.y + layer.image.height() as i32).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let ox = (tx - layer.position.x) as u32;
            let oy = (ty - layer.position.y) as u32;

            let fg = *layer.image.get_pixel(ox, oy);
            let bg = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bg, fg));
        }
    }
}

/// Porter-Duff "over": result = fg + bg * (1 - fg.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
