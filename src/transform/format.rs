//! Encoded image formats and extension mapping
//!
//! File extensions and encoded formats are compared with the single
//! equivalence `jpg ≡ jpeg`. Extensions produced from a detected format
//! always use the short `jpg` spelling.

use std::str::FromStr;

use super::error::ImageError;

/// Encoded image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// File extension for this format, folding `jpeg` to `jpg`
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Format implied by a file extension, if it names a known image format
    pub fn from_extension(extension: &str) -> Option<Self> {
        extension.parse().ok()
    }

    /// Detect the encoded format from magic bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        image::guess_format(data).ok().and_then(Self::from_image_format)
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
        }
    }

    /// Check whether `extension` truthfully describes this format
    pub fn matches_extension(&self, extension: &str) -> bool {
        Self::from_extension(extension) == Some(*self)
    }
}

impl FromStr for ImageFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "webp" => Ok(ImageFormat::WebP),
            "gif" => Ok(ImageFormat::Gif),
            _ => Err(ImageError::unsupported_format(s)),
        }
    }
}
