//! Saved artifact location.
//!
//! A [`SaveTarget`] is an immutable snapshot of `{directory, file_name, path}`.
//! Every successful write or rename produces a new snapshot through
//! [`SaveTarget::commit`]; `path` is always `directory.join(file_name)` and is
//! never updated ahead of the filesystem operation it describes.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    directory: PathBuf,
    file_name: Option<String>,
    path: Option<PathBuf>,
}

impl SaveTarget {
    /// Create an empty target rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_name: None,
            path: None,
        }
    }

    /// Snapshot pointing at `file_name` inside the same directory.
    ///
    /// Call only after the write or rename producing `file_name` succeeded.
    pub fn commit(&self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let path = self.directory.join(&file_name);
        Self {
            directory: self.directory.clone(),
            file_name: Some(file_name),
            path: Some(path),
        }
    }

    /// Snapshot with the same stem and a different extension.
    ///
    /// Returns `None` while the target is still empty.
    pub fn with_extension(&self, extension: &str) -> Option<Self> {
        let stem = self.stem()?;
        Some(self.commit(format!("{}.{}", stem, extension)))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name without its final extension.
    pub fn stem(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        Some(name.rsplit_once('.').map_or(name, |(stem, _)| stem))
    }

    /// Extension of the current file name (substring after the final `.`).
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        name.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn is_acquired(&self) -> bool {
        self.file_name.is_some()
    }
}
