// Image Saver Library
// Acquire files from URLs or multipart uploads, validate them, and normalize,
// transform or caption saved images in place.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod orientation;
pub mod overlay;
pub mod saver;
pub mod source;
pub mod target;
pub mod transform;
pub mod validator;

pub use config::SaverConfig;
pub use error::{ErrorCode, Result, SaverError};
pub use overlay::{Gravity, OverlayPosition, TextOverlay, TextStyle};
pub use saver::{Acquirable, FileSaver, ImageSaver, ProcessRequest, Processable};
pub use source::{SourceDescriptor, UploadStream};
pub use target::SaveTarget;
pub use transform::{ImageFormat, TransformChain, TransformProgram};
