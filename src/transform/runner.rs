//! Transform pipeline runner
//!
//! Reads the stored file, feeds it through a [`TransformProgram`], writes the
//! result back in place and renames the file when the encoded format drifted
//! away from its extension.

use image::io::Reader as ImageReader;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::chain::TransformProgram;
use super::error::ImageError;
use super::format::ImageFormat;
use crate::error::SaverError;
use crate::target::SaveTarget;

/// Basic facts about a stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Read dimensions and encoded format from image bytes without a full decode.
pub fn metadata_from_bytes(data: &[u8]) -> Result<ImageMetadata, ImageError> {
    let format = ImageFormat::detect(data)
        .ok_or_else(|| ImageError::unsupported_format("unrecognized image data"))?;
    let (width, height) = ImageReader::with_format(Cursor::new(data), format.to_image_format())
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

    Ok(ImageMetadata {
        width,
        height,
        format,
    })
}

/// Read dimensions and encoded format of the file at `path`.
pub async fn metadata(path: impl AsRef<Path>) -> Result<ImageMetadata, SaverError> {
    let data = tokio::fs::read(path.as_ref()).await?;
    Ok(metadata_from_bytes(&data)?)
}

/// Run `program` over the file behind `target`.
///
/// Returns the snapshot describing the file after the run. When the output's
/// encoded format disagrees with the current extension the file is renamed
/// and the returned snapshot carries the new name; otherwise it equals
/// `target`.
pub async fn process_file(
    target: &SaveTarget,
    program: Arc<dyn TransformProgram>,
) -> Result<SaveTarget, SaverError> {
    let path = target
        .path()
        .ok_or(SaverError::RequiredArgumentMissing("file_name"))?
        .to_path_buf();

    let input = tokio::fs::read(&path).await?;
    let input_len = input.len();
    let output =
        tokio::task::spawn_blocking(move || program.apply(&input)).await.map_err(ImageError::from)??;

    // The extension must always describe the stored bytes
    let detected = ImageFormat::detect(&output)
        .ok_or_else(|| ImageError::unsupported_format("unrecognized transform output"))?;

    tokio::fs::write(&path, &output).await?;

    debug!(
        path = %path.display(),
        input_bytes = input_len,
        output_bytes = output.len(),
        "Transform applied"
    );

    let current_extension = target.extension().unwrap_or_default();
    if detected.matches_extension(current_extension) {
        return Ok(target.clone());
    }
    let new_extension = detected.extension();

    let renamed = target
        .with_extension(new_extension)
        .ok_or(SaverError::RequiredArgumentMissing("file_name"))?;
    let new_path = renamed
        .path()
        .ok_or(SaverError::RequiredArgumentMissing("file_name"))?;

    tokio::fs::rename(&path, new_path).await?;

    info!(
        from = %path.display(),
        to = %new_path.display(),
        "Renamed after format drift"
    );

    Ok(renamed)
}
