//! Extension allow-list validation.
//!
//! The extension of a name is whatever follows its final `.`. A name without
//! a dot yields the whole name, which normally fails validation.
//! Comparison is case-sensitive against the configured list.

use url::Url;

/// Set of accepted extensions, read-only for the lifetime of a saver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    extensions: Vec<String>,
}

impl ValidationPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Extract the extension of a file name: the substring after the final `.`.
pub fn extract_extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Extract the extension from the last segment of a URL path.
///
/// Query string and fragment never participate.
pub fn url_extension(url: &Url) -> &str {
    let last_segment = url.path().rsplit('/').next().unwrap_or_default();
    extract_extension(last_segment)
}

/// Check whether `extension` is in the allow-list.
pub fn is_accepted(extension: &str, policy: &ValidationPolicy) -> bool {
    policy.extensions.iter().any(|allowed| allowed == extension)
}
