// Error types module

use crate::transform::ImageError;
use std::fmt;
use thiserror::Error;

/// Centralized error type for the saver
///
/// Every variant maps to a stable [`ErrorCode`] so callers can branch on
/// `err.code()` instead of matching display strings.
#[derive(Error, Debug)]
pub enum SaverError {
    /// A mandatory constructor or call argument is absent
    #[error("Required argument is missing: {0}")]
    RequiredArgumentMissing(&'static str),

    /// Source is neither a parseable URL nor a valid upload stream
    #[error("File source is broken: {0}")]
    SourceBroken(String),

    /// Extension (or decoded content) not accepted by the configured policy
    #[error("Unsupported file format: {0}")]
    FormatUnsupported(String),

    /// Remote transfer failed after validation passed
    #[error("Cannot load file: {0}")]
    CannotLoad(String),

    /// Filesystem read/write/rename failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pixel transform, overlay or encoding failure
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// Invalid configuration values or YAML
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RequiredArgumentMissing,
    SourceBroken,
    FormatUnsupported,
    CannotLoad,
    Filesystem,
    ImageProcessing,
    ConfigInvalid,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredArgumentMissing => "REQUIRED_ARGUMENT_MISSING",
            Self::SourceBroken => "SOURCE_BROKEN",
            Self::FormatUnsupported => "FORMAT_UNSUPPORTED",
            Self::CannotLoad => "CANNOT_LOAD",
            Self::Filesystem => "FILESYSTEM",
            Self::ImageProcessing => "IMAGE_PROCESSING",
            Self::ConfigInvalid => "CONFIG_INVALID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SaverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SaverError::RequiredArgumentMissing(_) => ErrorCode::RequiredArgumentMissing,
            SaverError::SourceBroken(_) => ErrorCode::SourceBroken,
            SaverError::FormatUnsupported(_) => ErrorCode::FormatUnsupported,
            SaverError::CannotLoad(_) => ErrorCode::CannotLoad,
            SaverError::Io(_) => ErrorCode::Filesystem,
            SaverError::Image(_) => ErrorCode::ImageProcessing,
            SaverError::Config(_) => ErrorCode::ConfigInvalid,
        }
    }

    pub fn source_broken(message: impl Into<String>) -> Self {
        SaverError::SourceBroken(message.into())
    }

    pub fn format_unsupported(extension: impl Into<String>) -> Self {
        SaverError::FormatUnsupported(extension.into())
    }

    pub fn cannot_load(message: impl Into<String>) -> Self {
        SaverError::CannotLoad(message.into())
    }

    /// Error body for callers that relay failures over HTTP
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code().as_str(),
                "message": self.to_string(),
            }
        })
    }
}

pub type Result<T> = std::result::Result<T, SaverError>;
