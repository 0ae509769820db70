//! Pixel transform programs
//!
//! A [`TransformProgram`] takes the stored file's bytes and returns the new
//! bytes. The runner treats it as a black box and only looks at the encoded
//! format of whatever comes back.
//!
//! [`TransformChain`] is the built-in program: decode → steps → encode.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::fmt;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::encoder::{encode_dynamic, EncoderQuality};
use super::error::ImageError;
use super::format::ImageFormat;
use crate::constants::DEFAULT_TRANSFORM_QUALITY;

/// Caller-constructed pixel transform
pub trait TransformProgram: Send + Sync {
    /// Transform encoded image bytes into new encoded image bytes
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, ImageError>;
}

impl<F> TransformProgram for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, ImageError> + Send + Sync,
{
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, ImageError> {
        self(input)
    }
}

/// Single step of a [`TransformChain`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    /// Resize to exactly `width` x `height` (Lanczos3)
    Resize { width: u32, height: u32 },
    /// Scale to `width`, keeping aspect ratio
    ResizeWidth(u32),
    /// Gaussian blur with the given sigma
    Blur(f32),
    Grayscale,
    /// Clockwise rotation; only multiples of 90 are accepted
    Rotate(u16),
    FlipHorizontal,
    FlipVertical,
}

/// Ordered list of pixel steps followed by an encode
///
/// ```ignore
/// let chain = TransformChain::new()
///     .resize(100, 100)
///     .blur(3.0)
///     .format(ImageFormat::Jpeg)
///     .quality(60);
/// ```
#[derive(Clone, Default)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
    format: Option<ImageFormat>,
    quality: Option<u8>,
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("steps", &self.steps)
            .field("format", &self.format.map(|fmt| fmt.as_str()))
            .field("quality", &self.quality)
            .finish()
    }
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: TransformStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn resize(self, width: u32, height: u32) -> Self {
        self.step(TransformStep::Resize { width, height })
    }

    pub fn resize_width(self, width: u32) -> Self {
        self.step(TransformStep::ResizeWidth(width))
    }

    pub fn blur(self, sigma: f32) -> Self {
        self.step(TransformStep::Blur(sigma))
    }

    pub fn grayscale(self) -> Self {
        self.step(TransformStep::Grayscale)
    }

    pub fn rotate(self, degrees: u16) -> Self {
        self.step(TransformStep::Rotate(degrees))
    }

    pub fn flip_horizontal(self) -> Self {
        self.step(TransformStep::FlipHorizontal)
    }

    pub fn flip_vertical(self) -> Self {
        self.step(TransformStep::FlipVertical)
    }

    /// Output format; defaults to the input's detected format
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }
}

impl TransformProgram for TransformChain {
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, ImageError> {
        let source_format = ImageFormat::detect(input)
            .ok_or_else(|| ImageError::unsupported_format("unrecognized image data"))?;
        let mut img = decode_image(input)?;

        for step in &self.steps {
            img = apply_step(img, *step)?;
        }

        let output_format = self.format.unwrap_or(source_format);
        let quality =
            EncoderQuality::with_quality(self.quality.unwrap_or(DEFAULT_TRANSFORM_QUALITY));

        Ok(encode_dynamic(&img, output_format, quality)?.data)
    }
}

fn apply_step(img: DynamicImage, step: TransformStep) -> Result<DynamicImage, ImageError> {
    match step {
        TransformStep::Resize { width, height } => resize_image(&img, width, height),
        TransformStep::ResizeWidth(width) => {
            if img.width() == 0 {
                return Err(ImageError::resize_failed("Source width is 0"));
            }
            let height = (img.height() as f64 * width as f64 / img.width() as f64).round() as u32;
            resize_image(&img, width, height.max(1))
        }
        TransformStep::Blur(sigma) => {
            if !(sigma > 0.0) {
                return Err(ImageError::invalid_param(
                    "blur",
                    format!("sigma must be positive, got {}", sigma),
                ));
            }
            Ok(img.blur(sigma))
        }
        TransformStep::Grayscale => Ok(img.grayscale()),
        TransformStep::Rotate(degrees) => match degrees % 360 {
            0 => Ok(img),
            90 => Ok(img.rotate90()),
            180 => Ok(img.rotate180()),
            270 => Ok(img.rotate270()),
            other => Err(ImageError::invalid_param(
                "rotate",
                format!("only multiples of 90 are supported, got {}", other),
            )),
        },
        TransformStep::FlipHorizontal => Ok(img.fliph()),
        TransformStep::FlipVertical => Ok(img.flipv()),
    }
}

/// Decode image data into a DynamicImage
pub(crate) fn decode_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, ImageError> {
    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width = NonZeroU32::new(target_w).ok_or_else(|| ImageError::InvalidDimensions {
        width: target_w,
        height: target_h,
        reason: "target width is 0".to_string(),
    })?;
    let dst_height = NonZeroU32::new(target_h).ok_or_else(|| ImageError::InvalidDimensions {
        width: target_w,
        height: target_h,
        reason: "target height is 0".to_string(),
    })?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
