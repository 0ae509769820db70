//! Position calculation for overlay placement.
//!
//! An [`OverlayPosition`] is either a named anchor on the 9-grid or a
//! percentage offset of the overlay's top-left corner. Both are resolved
//! against the current image at composite time.
//!
//! ```ignore
//! let image = ImageDimensions { width: 800, height: 600 };
//! let overlay = OverlayDimensions { width: 100, height: 50 };
//!
//! let pos = OverlayPosition::Anchor(Gravity::SouthEast).resolve(&image, &overlay)?;
//! assert_eq!(pos, PlacementPosition::new(700, 550));
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::transform::ImageError;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of a rendered overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of an overlay on the image. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Named anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    #[serde(alias = "centre")]
    Center,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl FromStr for Gravity {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "center" | "centre" | "c" => Ok(Gravity::Center),
            "north" | "n" => Ok(Gravity::North),
            "northeast" | "ne" => Ok(Gravity::NorthEast),
            "east" | "e" => Ok(Gravity::East),
            "southeast" | "se" => Ok(Gravity::SouthEast),
            "south" | "s" => Ok(Gravity::South),
            "southwest" | "sw" => Ok(Gravity::SouthWest),
            "west" | "w" => Ok(Gravity::West),
            "northwest" | "nw" => Ok(Gravity::NorthWest),
            _ => Err(ImageError::invalid_param(
                "gravity",
                format!("unknown gravity: {}", s),
            )),
        }
    }
}

/// Where an overlay goes
///
/// Deserializes from either a gravity keyword (`"southeast"`) or a
/// `{ x, y }` map of percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverlayPosition {
    Anchor(Gravity),
    /// Top-left corner at `x`% of the width and `y`% of the height.
    ///
    /// The overlay is not centred on the point: `{ x: 50, y: 50 }` puts its
    /// top-left corner at the image centre. Use `Anchor(Gravity::Center)` to
    /// centre it.
    Percent { x: f32, y: f32 },
}

impl Default for OverlayPosition {
    fn default() -> Self {
        OverlayPosition::Anchor(Gravity::Center)
    }
}

impl From<Gravity> for OverlayPosition {
    fn from(gravity: Gravity) -> Self {
        OverlayPosition::Anchor(gravity)
    }
}

impl OverlayPosition {
    /// Resolve to pixel coordinates for an overlay of the given size.
    pub fn resolve(
        &self,
        image: &ImageDimensions,
        overlay: &OverlayDimensions,
    ) -> Result<PlacementPosition, ImageError> {
        match *self {
            OverlayPosition::Anchor(gravity) => Ok(calculate_position(gravity, image, overlay)),
            OverlayPosition::Percent { x, y } => {
                check_percent("x", x)?;
                check_percent("y", y)?;
                Ok(PlacementPosition::new(
                    (image.width as f32 * x / 100.0).round() as i32,
                    (image.height as f32 * y / 100.0).round() as i32,
                ))
            }
        }
    }
}

fn check_percent(axis: &str, value: f32) -> Result<(), ImageError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ImageError::invalid_param(
            "position",
            format!("{} must be within 0-100, got {}", axis, value),
        ))
    }
}

/// Calculate the 9-grid position for a single overlay.
///
/// Coordinates may be negative if the overlay is larger than the image.
pub fn calculate_position(
    gravity: Gravity,
    image: &ImageDimensions,
    overlay: &OverlayDimensions,
) -> PlacementPosition {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let ov_w = overlay.width as i32;
    let ov_h = overlay.height as i32;

    let center_x = (img_w - ov_w) / 2;
    let right = img_w - ov_w;
    let center_y = (img_h - ov_h) / 2;
    let bottom = img_h - ov_h;

    match gravity {
        Gravity::NorthWest => PlacementPosition::new(0, 0),
        Gravity::North => PlacementPosition::new(center_x, 0),
        Gravity::NorthEast => PlacementPosition::new(right, 0),
        Gravity::West => PlacementPosition::new(0, center_y),
        Gravity::Center => PlacementPosition::new(center_x, center_y),
        Gravity::East => PlacementPosition::new(right, center_y),
        Gravity::SouthWest => PlacementPosition::new(0, bottom),
        Gravity::South => PlacementPosition::new(center_x, bottom),
        Gravity::SouthEast => PlacementPosition::new(right, bottom),
    }
}
