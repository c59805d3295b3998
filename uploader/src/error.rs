//! Error taxonomy shared by the locator, the uploaders, and the orchestrator.
//!
//! Wire-level code (the YouTube API client, OAuth) speaks [`eyre::Result`]; those reports are
//! wrapped in [`UploadError::Remote`] at the uploader boundary so that callers can tell a local
//! validation problem apart from something the platform rejected.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Required credentials or settings are missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The file does not satisfy a platform constraint (size, format).
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The platform API rejected the call.
    #[error("{0:#}")]
    Remote(eyre::Report),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("unsupported video format: {extension} (supported: {supported})")]
    UnsupportedFormat {
        extension: String,
        supported: String,
    },

    #[error("no refresh token configured for account {0}")]
    UnknownAccount(String),

    #[error("unknown platform '{0}' (expected one of: youtube, instagram, facebook)")]
    UnknownPlatform(String),

    #[error("invalid schedule time '{0}'; use ISO format such as 2024-01-15T10:30:00")]
    InvalidScheduleTime(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<eyre::Report> for UploadError {
    fn from(report: eyre::Report) -> Self {
        Self::Remote(report)
    }
}
