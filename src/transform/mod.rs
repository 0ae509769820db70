//! Image transform pipeline
//!
//! Provides:
//! - The [`TransformProgram`] seam and the built-in [`TransformChain`]
//!   (resize, blur, grayscale, rotate, flip, re-encode)
//! - Encoders for JPEG, PNG, WebP and GIF
//! - Format detection with `jpg ≡ jpeg` extension folding
//! - The runner that rewrites a stored file and renames it on format drift

pub mod chain;
pub mod encoder;
pub mod error;
pub mod format;
pub mod runner;

pub use chain::{TransformChain, TransformProgram, TransformStep};
pub use encoder::{encode_dynamic, EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::ImageError;
pub use format::ImageFormat;
pub use runner::{metadata, metadata_from_bytes, process_file, ImageMetadata};

pub(crate) use chain::decode_image;
