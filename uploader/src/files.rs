//! Locating candidate video files on disk.

use crate::error::UploadError;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// File extensions (lowercase, without the dot) that any platform accepts.
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

/// A video file that has been confirmed to exist, be a regular file, and carry a supported
/// extension.
///
/// Values are only produced by [`resolve`] and [`scan_directory`], so holding one is proof that
/// those checks passed at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoFile {
    path: PathBuf,
    name: String,
    size: u64,
    #[serde(serialize_with = "dotted_extension")]
    extension: String,
    exists: bool,
}

impl VideoFile {
    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes as observed when the file was located.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercase extension without the leading dot, e.g. `"mp4"`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    fn from_parts(path: PathBuf, size: u64, extension: String) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            size,
            extension,
            exists: true,
        }
    }
}

fn dotted_extension<S: Serializer>(extension: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!(".{extension}"))
}

/// Returns the lowercase extension of `path` if it is one of [`SUPPORTED_VIDEO_EXTENSIONS`].
pub fn supported_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_VIDEO_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn unsupported(path: &Path) -> UploadError {
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_else(|| "(none)".to_string());
    UploadError::UnsupportedFormat {
        extension,
        supported: SUPPORTED_VIDEO_EXTENSIONS
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, UploadError> {
    std::path::absolute(path).map_err(|e| UploadError::io(path, e))
}

/// Resolves a single path into a [`VideoFile`].
///
/// Fails with [`UploadError::NotFound`] if nothing exists at `path`, [`UploadError::NotAFile`]
/// if it is a directory or other non-regular file, and [`UploadError::UnsupportedFormat`] if the
/// extension is not a supported video format.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn resolve(path: impl AsRef<Path>) -> Result<VideoFile, UploadError> {
    let path = absolute(path.as_ref())?;
    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(path));
        }
        Err(e) => return Err(UploadError::io(path, e)),
    };

    if !metadata.is_file() {
        return Err(UploadError::NotAFile(path));
    }

    let Some(extension) = supported_extension(&path) else {
        return Err(unsupported(&path));
    };

    Ok(VideoFile::from_parts(path, metadata.len(), extension))
}

/// Lists the supported video files directly inside `dir`.
///
/// Entries that are not regular files or that have an unsupported extension are skipped, not
/// reported. The result preserves the order in which the directory listing returned entries.
#[tracing::instrument(level = "debug", skip_all, fields(dir = %dir.as_ref().display()))]
pub fn scan_directory(dir: impl AsRef<Path>) -> Result<Vec<VideoFile>, UploadError> {
    let dir = absolute(dir.as_ref())?;
    let metadata = match std::fs::metadata(&dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(dir));
        }
        Err(e) => return Err(UploadError::io(dir, e)),
    };
    if !metadata.is_dir() {
        return Err(UploadError::NotADirectory(dir));
    }

    let entries = std::fs::read_dir(&dir).map_err(|e| UploadError::io(&dir, e))?;
    let mut videos = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| UploadError::io(&dir, e))?;
        let path = entry.path();
        // follow symlinks, like a plain stat would
        let Ok(metadata) = std::fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Some(extension) = supported_extension(&path) else {
            continue;
        };
        videos.push(VideoFile::from_parts(path, metadata.len(), extension));
    }

    tracing::debug!(found = videos.len(), "scanned video directory");
    Ok(videos)
}

/// Formats a byte count for humans, e.g. `1536` becomes `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut whole = bytes;
    while whole >= 1024 && exponent < UNITS.len() - 1 {
        whole /= 1024;
        exponent += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[exponent])
}
