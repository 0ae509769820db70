//! File and image savers.
//!
//! [`FileSaver`] acquires a file from a URL or an upload into the configured
//! directory after checking its extension. [`ImageSaver`] wraps a
//! `FileSaver`, additionally requires the bytes to be a readable image,
//! rights EXIF-rotated images, and can run transforms and text overlays over
//! a saved image.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::SaverConfig;
use crate::constants::DEFAULT_IMAGE_EXTENSIONS;
use crate::error::{Result, SaverError};
use crate::orientation;
use crate::overlay::{composite_file, OverlayPosition, TextOverlay};
use crate::source::{
    remove_best_effort, save_upload, HttpTransfer, SourceDescriptor, Transfer, UploadStream,
};
use crate::target::SaveTarget;
use crate::transform::{self, process_file, TransformProgram};
use crate::validator::{extract_extension, is_accepted, url_extension, ValidationPolicy};

/// Brings a file from a source into the target directory
#[async_trait]
pub trait Acquirable: Send + Sync {
    /// Acquire `source` as `<target_name>.<extension>`.
    ///
    /// `target_name` defaults to a fresh UUID v4.
    async fn download(
        &self,
        source: SourceDescriptor,
        target_name: Option<&str>,
    ) -> Result<SaveTarget>;
}

/// Rewrites an already acquired file
#[async_trait]
pub trait Processable: Send + Sync {
    /// Returns the snapshot after processing; the name changes on format drift.
    async fn process(&self, target: &SaveTarget, request: ProcessRequest) -> Result<SaveTarget>;
}

/// What [`ImageSaver::process`] should do
///
/// The transform runs first, then the overlays.
#[derive(Clone, Default)]
pub struct ProcessRequest {
    pub transform: Option<Arc<dyn TransformProgram>>,
    pub overlays: Vec<TextOverlay>,
    /// Position for overlays that don't carry their own
    pub overlay_position: Option<OverlayPosition>,
}

impl ProcessRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(mut self, program: impl TransformProgram + 'static) -> Self {
        self.transform = Some(Arc::new(program));
        self
    }

    pub fn overlay(mut self, overlay: TextOverlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn overlays(mut self, overlays: impl IntoIterator<Item = TextOverlay>) -> Self {
        self.overlays.extend(overlays);
        self
    }

    pub fn overlay_position(mut self, position: impl Into<OverlayPosition>) -> Self {
        self.overlay_position = Some(position.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transform.is_none() && self.overlays.is_empty()
    }
}

impl fmt::Debug for ProcessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRequest")
            .field("transform", &self.transform.is_some())
            .field("overlays", &self.overlays)
            .field("overlay_position", &self.overlay_position)
            .finish()
    }
}

/// Generic file acquisition with an extension allow-list
pub struct FileSaver {
    config: SaverConfig,
    policy: ValidationPolicy,
    transfer: Arc<dyn Transfer>,
}

impl fmt::Debug for FileSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSaver")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl FileSaver {
    /// Saver whose policy is `config.valid_extensions`, or nothing when unset.
    pub fn new(config: SaverConfig) -> Result<Self> {
        let transfer = HttpTransfer::new(config.timeout(), config.user_agent.as_deref())?;
        Self::with_transfer(config, Arc::new(transfer))
    }

    pub fn with_transfer(config: SaverConfig, transfer: Arc<dyn Transfer>) -> Result<Self> {
        let policy = ValidationPolicy::new(config.valid_extensions.clone().unwrap_or_default());
        Self::with_policy(config, policy, transfer)
    }

    fn with_policy(
        config: SaverConfig,
        policy: ValidationPolicy,
        transfer: Arc<dyn Transfer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            policy,
            transfer,
        })
    }

    pub fn config(&self) -> &SaverConfig {
        &self.config
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    fn check_extension<'a>(&self, extension: &'a str) -> Result<&'a str> {
        if is_accepted(extension, &self.policy) {
            Ok(extension)
        } else {
            Err(SaverError::format_unsupported(extension))
        }
    }

    async fn download_url(&self, raw: &str, name: &str) -> Result<SaveTarget> {
        if raw.is_empty() {
            return Err(SaverError::RequiredArgumentMissing("source"));
        }

        let url = Url::parse(raw).map_err(|e| SaverError::source_broken(e.to_string()))?;
        let extension = self.check_extension(url_extension(&url))?;

        tokio::fs::create_dir_all(&self.config.target_dir).await?;

        let target = SaveTarget::new(&self.config.target_dir).commit(format!("{}.{}", name, extension));
        let path = target
            .path()
            .ok_or(SaverError::RequiredArgumentMissing("file_name"))?;

        match self.transfer.fetch_to(&url, path).await {
            Ok(bytes) => {
                info!(
                    url = %url,
                    file_name = target.file_name().unwrap_or_default(),
                    bytes,
                    "Download complete"
                );
                Ok(target)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Download failed");
                remove_best_effort(path).await;
                Err(e.into())
            }
        }
    }

    async fn download_upload(&self, upload: UploadStream, name: &str) -> Result<SaveTarget> {
        let directory = &self.config.target_dir;
        tokio::fs::create_dir_all(directory).await?;

        let uploaded = save_upload(upload, directory).await?;

        let extension = match self.check_extension(extract_extension(&uploaded.declared_name)) {
            Ok(extension) => extension,
            Err(e) => {
                remove_best_effort(&uploaded.temp_path).await;
                return Err(e);
            }
        };

        let file_name = format!("{}.{}", name, extension);
        let final_path = directory.join(&file_name);

        if let Err(e) = tokio::fs::rename(&uploaded.temp_path, &final_path).await {
            remove_best_effort(&uploaded.temp_path).await;
            return Err(e.into());
        }

        info!(
            declared_name = %uploaded.declared_name,
            file_name = %file_name,
            bytes = uploaded.size,
            "Upload saved"
        );

        Ok(SaveTarget::new(directory).commit(file_name))
    }
}

#[async_trait]
impl Acquirable for FileSaver {
    async fn download(
        &self,
        source: SourceDescriptor,
        target_name: Option<&str>,
    ) -> Result<SaveTarget> {
        let name = match target_name {
            Some(name) => name.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        match source {
            SourceDescriptor::Url(raw) => self.download_url(&raw, &name).await,
            SourceDescriptor::Upload(upload) => self.download_upload(upload, &name).await,
        }
    }
}

/// Image acquisition and processing
///
/// Accepts `jpg` and `png` unless `valid_extensions` is configured.
#[derive(Debug)]
pub struct ImageSaver {
    files: FileSaver,
}

impl ImageSaver {
    pub fn new(config: SaverConfig) -> Result<Self> {
        let transfer = HttpTransfer::new(config.timeout(), config.user_agent.as_deref())?;
        Self::with_transfer(config, Arc::new(transfer))
    }

    pub fn with_transfer(config: SaverConfig, transfer: Arc<dyn Transfer>) -> Result<Self> {
        let policy = match &config.valid_extensions {
            Some(extensions) => ValidationPolicy::new(extensions.iter().cloned()),
            None => ValidationPolicy::new(DEFAULT_IMAGE_EXTENSIONS.iter().copied()),
        };
        Ok(Self {
            files: FileSaver::with_policy(config, policy, transfer)?,
        })
    }

    pub fn config(&self) -> &SaverConfig {
        self.files.config()
    }

    pub fn policy(&self) -> &ValidationPolicy {
        self.files.policy()
    }

    fn quality(&self) -> u8 {
        self.files.config().quality
    }

    /// Reject files whose bytes are not a readable image, deleting them.
    async fn ensure_image(&self, target: &SaveTarget, path: &Path) -> Result<()> {
        if let Err(e) = transform::metadata(path).await {
            debug!(path = %path.display(), error = %e, "Saved file is not a readable image");
            remove_best_effort(path).await;
            return Err(SaverError::format_unsupported(
                target.extension().unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Acquirable for ImageSaver {
    async fn download(
        &self,
        source: SourceDescriptor,
        target_name: Option<&str>,
    ) -> Result<SaveTarget> {
        let target = self.files.download(source, target_name).await?;
        let path = target
            .path()
            .ok_or(SaverError::RequiredArgumentMissing("file_name"))?;

        self.ensure_image(&target, path).await?;

        match orientation::normalize(path, self.quality()).await {
            Ok(true) => debug!(path = %path.display(), "Orientation normalized"),
            Ok(false) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "Orientation normalization skipped"),
        }

        Ok(target)
    }
}

#[async_trait]
impl Processable for ImageSaver {
    async fn process(&self, target: &SaveTarget, request: ProcessRequest) -> Result<SaveTarget> {
        if !target.is_acquired() {
            return Err(SaverError::RequiredArgumentMissing("file_name"));
        }
        if request.is_empty() {
            return Err(SaverError::RequiredArgumentMissing("transform or overlays"));
        }

        let mut current = target.clone();

        if let Some(program) = request.transform {
            current = process_file(&current, program).await?;
        }

        if !request.overlays.is_empty() {
            composite_file(
                &current,
                &request.overlays,
                request.overlay_position,
                self.quality(),
            )
            .await?;
        }

        info!(
            from = target.file_name().unwrap_or_default(),
            to = current.file_name().unwrap_or_default(),
            overlays = request.overlays.len(),
            "Image processed"
        );

        Ok(current)
    }
}
