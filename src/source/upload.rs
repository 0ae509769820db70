//! Multipart upload intake.
//!
//! Only the first part carrying a file name is read. Its body is streamed to
//! `upload_<uuid>.tmp` inside the target directory; the caller decides
//! whether to keep it (rename into place) or drop it.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::{remove_best_effort, UploadStream};
use crate::constants::{UPLOAD_TEMP_EXTENSION, UPLOAD_TEMP_PREFIX};
use crate::error::SaverError;

/// File part written to a temporary location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name declared by the client in the part headers
    pub declared_name: String,
    pub temp_path: PathBuf,
    pub size: u64,
}

fn temp_path(directory: &Path) -> PathBuf {
    directory.join(format!(
        "{}{}.{}",
        UPLOAD_TEMP_PREFIX,
        Uuid::new_v4(),
        UPLOAD_TEMP_EXTENSION
    ))
}

/// Stream the first file part of `upload` into `directory`.
///
/// Fails with `SourceBroken` when the boundary is missing, the body is not
/// valid multipart, or no part declares a file name.
pub async fn save_upload(
    upload: UploadStream,
    directory: &Path,
) -> Result<UploadedFile, SaverError> {
    let (content_type, body) = upload.into_parts();

    let boundary = multer::parse_boundary(&content_type)
        .map_err(|e| SaverError::source_broken(format!("invalid multipart content type: {}", e)))?;
    let mut multipart = multer::Multipart::new(body, boundary);

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(SaverError::source_broken("upload contains no file part")),
            Err(e) => return Err(SaverError::source_broken(e.to_string())),
        };

        let declared_name = match field.file_name() {
            Some(name) => name.to_string(),
            None => {
                debug!(field = ?field.name(), "Skipping non-file multipart field");
                continue;
            }
        };

        let temp_path = temp_path(directory);
        let mut file = tokio::fs::File::create(&temp_path).await?;
        let mut size = 0u64;

        let written: Result<(), SaverError> = async {
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| SaverError::source_broken(e.to_string()))?
            {
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            remove_best_effort(&temp_path).await;
            return Err(e);
        }

        debug!(
            declared_name = %declared_name,
            temp_path = %temp_path.display(),
            bytes = size,
            "Upload part stored"
        );

        return Ok(UploadedFile {
            declared_name,
            temp_path,
            size,
        });
    }
}

/// Build a `multipart/form-data` body from `(field, file_name, bytes)` parts.
#[cfg(test)]
pub(crate) fn multipart_body(
    boundary: &str,
    parts: &[(&str, Option<&str>, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
