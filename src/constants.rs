// Constants module - centralized default values for configuration
//
// Defaults shared by the config layer, the savers and the image pipeline.

// =============================================================================
// Acquisition defaults
// =============================================================================

/// Default remote transfer timeout in seconds
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 10;

/// Extensions accepted by the image profile when none are configured
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Prefix of temporary files written while an upload is being received
pub const UPLOAD_TEMP_PREFIX: &str = "upload_";

/// Extension of temporary upload files
pub const UPLOAD_TEMP_EXTENSION: &str = "tmp";

// =============================================================================
// Image defaults
// =============================================================================

/// Default re-encode quality for lossy formats (orientation fix, compositing)
pub const DEFAULT_QUALITY: u8 = 100;

/// Default quality used by `TransformChain` when none is set
pub const DEFAULT_TRANSFORM_QUALITY: u8 = 80;

/// Default overlay font size in pixels
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Largest accepted overlay font size in pixels
pub const MAX_FONT_SIZE: f32 = 1024.0;
