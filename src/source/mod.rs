//! Where a file comes from.
//!
//! A [`SourceDescriptor`] is either a remote URL or a multipart upload body.
//! [`remote`] fetches URLs through the [`Transfer`] seam; [`upload`] pulls the
//! first file part out of a multipart stream.

pub mod remote;
pub mod upload;

pub use remote::{HttpTransfer, Transfer, TransferError};
pub use upload::{save_upload, UploadedFile};

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Input to an acquisition
pub enum SourceDescriptor {
    /// Remote resource; parsed when the download starts
    Url(String),
    /// Multipart request body
    Upload(UploadStream),
}

impl SourceDescriptor {
    pub fn url(url: impl Into<String>) -> Self {
        SourceDescriptor::Url(url.into())
    }
}

impl From<&str> for SourceDescriptor {
    fn from(url: &str) -> Self {
        SourceDescriptor::Url(url.to_string())
    }
}

impl From<String> for SourceDescriptor {
    fn from(url: String) -> Self {
        SourceDescriptor::Url(url)
    }
}

impl From<UploadStream> for SourceDescriptor {
    fn from(upload: UploadStream) -> Self {
        SourceDescriptor::Upload(upload)
    }
}

impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::Url(url) => f.debug_tuple("Url").field(url).finish(),
            SourceDescriptor::Upload(upload) => f.debug_tuple("Upload").field(upload).finish(),
        }
    }
}

/// Streaming multipart request body plus its `Content-Type` header
///
/// The boundary is read from `content_type`, so pass the header value as
/// received (`multipart/form-data; boundary=...`).
pub struct UploadStream {
    content_type: String,
    body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

impl UploadStream {
    pub fn new<S>(content_type: impl Into<String>, body: S) -> Self
    where
        S: futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self {
            content_type: content_type.into(),
            body: body.boxed(),
        }
    }

    /// Body already held in memory
    pub fn from_bytes(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(content_type, stream::once(async move { Ok(body) }))
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub(crate) fn into_parts(self) -> (String, BoxStream<'static, Result<Bytes, std::io::Error>>) {
        (self.content_type, self.body)
    }
}

impl fmt::Debug for UploadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Delete `path`, logging instead of failing.
///
/// Used on error paths so cleanup never replaces the error being reported.
pub async fn remove_best_effort(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "Cleanup skipped");
    }
}
