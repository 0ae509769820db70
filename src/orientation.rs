//! Upright normalization from EXIF orientation.
//!
//! Best effort by contract: callers log and ignore any error returned here.
//! Only the pixel data changes; the file keeps its name and format.

use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;

use crate::error::SaverError;
use crate::transform::{decode_image, encode_dynamic, EncoderQuality, ImageError, ImageFormat};

/// EXIF orientation value meaning "already upright"
const ORIENTATION_NORMAL: u32 = 1;

/// Read the primary-image EXIF orientation tag (1-8).
pub fn read_orientation(data: &[u8]) -> Result<u32, ImageError> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .map_err(|e| ImageError::metadata_missing(e.to_string()))?;

    let field = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .ok_or_else(|| ImageError::metadata_missing("no orientation tag"))?;

    match field.value.get_uint(0) {
        Some(value @ 1..=8) => Ok(value),
        Some(value) => Err(ImageError::invalid_param(
            "orientation",
            format!("out of range: {}", value),
        )),
        None => Err(ImageError::metadata_missing("orientation tag is not numeric")),
    }
}

/// Rotate/flip `img` so that `orientation` becomes the identity.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Re-encode `data` upright. `None` when it already is.
pub fn upright_bytes(data: &[u8], quality: u8) -> Result<Option<Vec<u8>>, ImageError> {
    let orientation = read_orientation(data)?;
    if orientation == ORIENTATION_NORMAL {
        return Ok(None);
    }

    let format = ImageFormat::detect(data)
        .ok_or_else(|| ImageError::unsupported_format("unrecognized image data"))?;
    let img = apply_orientation(decode_image(data)?, orientation);
    let encoded = encode_dynamic(&img, format, EncoderQuality::with_quality(quality))?;

    Ok(Some(encoded.data))
}

/// Rewrite the file at `path` upright in place.
///
/// Returns whether the file was rewritten.
pub async fn normalize(path: &Path, quality: u8) -> Result<bool, SaverError> {
    let data = tokio::fs::read(path).await?;

    let upright = tokio::task::spawn_blocking(move || upright_bytes(&data, quality))
        .await
        .map_err(ImageError::from)??;

    match upright {
        Some(bytes) => {
            tokio::fs::write(path, bytes).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
