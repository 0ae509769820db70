// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_QUALITY, DEFAULT_TRANSFER_TIMEOUT_SECS};
use crate::error::SaverError;

fn default_timeout_secs() -> u64 {
    DEFAULT_TRANSFER_TIMEOUT_SECS
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

/// Saver configuration
///
/// `valid_extensions` is left unset by default so each profile can apply its
/// own allow-list: the file profile accepts nothing, the image profile accepts
/// `jpg` and `png`.
///
/// ```yaml
/// target_dir: /var/lib/uploads
/// valid_extensions: [jpg, png, webp]
/// timeout_secs: 15
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaverConfig {
    /// Output directory for saved files
    #[serde(default)]
    pub target_dir: PathBuf,

    /// Accepted extensions, compared case-sensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_extensions: Option<Vec<String>>,

    /// Remote transfer timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Re-encode quality (1-100) for orientation fixes and overlays
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// User-Agent sent with remote transfers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl SaverConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            valid_extensions: None,
            timeout_secs: DEFAULT_TRANSFER_TIMEOUT_SECS,
            quality: DEFAULT_QUALITY,
            user_agent: None,
        }
    }

    pub fn with_valid_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the transfer timeout, rounding sub-second parts up to a whole second.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, SaverError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| SaverError::Config(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing {
            return Err(SaverError::Config(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )));
        }

        let config: SaverConfig = serde_yaml::from_str(&substituted)
            .map_err(|e| SaverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SaverError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SaverError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), SaverError> {
        if self.target_dir.as_os_str().is_empty() {
            return Err(SaverError::RequiredArgumentMissing("target_dir"));
        }

        if self.timeout_secs == 0 {
            return Err(SaverError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.quality) {
            return Err(SaverError::Config(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        if let Some(extensions) = &self.valid_extensions {
            if let Some(bad) = extensions
                .iter()
                .find(|ext| ext.is_empty() || ext.contains('.'))
            {
                return Err(SaverError::Config(format!(
                    "Invalid extension '{}': extensions are listed without a leading dot",
                    bad
                )));
            }
        }

        Ok(())
    }
}
