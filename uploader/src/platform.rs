//! Platform-neutral upload vocabulary: which platforms exist, what they accept, and the shape of
//! a per-file outcome.

use crate::config::AccountId;
use crate::error::UploadError;
use crate::files::{self, VideoFile};
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    YouTube,
    Instagram,
    Facebook,
}

impl PlatformId {
    pub const ALL: [PlatformId; 3] = [Self::YouTube, Self::Instagram, Self::Facebook];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
        }
    }

    /// Upload constraints this platform imposes.
    pub fn limits(self) -> PlatformLimits {
        match self {
            Self::YouTube => PlatformLimits {
                max_bytes: 256 * MIB,
                extensions: &files::SUPPORTED_VIDEO_EXTENSIONS,
            },
            Self::Instagram => PlatformLimits {
                max_bytes: 100 * MIB,
                extensions: &["mp4", "mov"],
            },
            Self::Facebook => PlatformLimits {
                max_bytes: 4 * 1024 * MIB,
                extensions: &files::SUPPORTED_VIDEO_EXTENSIONS,
            },
        }
    }

    /// Parses a comma-separated platform list such as `"youtube, instagram"`.
    ///
    /// `all` expands to the platforms that have an uploader (currently only YouTube). Duplicates
    /// are dropped while the first-mention order is kept. Any unknown name fails the whole list.
    pub fn parse_list(csv: &str) -> Result<Vec<PlatformId>, UploadError> {
        let mut platforms = Vec::new();
        for name in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let parsed = if name.eq_ignore_ascii_case("all") {
                vec![Self::YouTube]
            } else {
                vec![name.parse()?]
            };
            for platform in parsed {
                if !platforms.contains(&platform) {
                    platforms.push(platform);
                }
            }
        }
        Ok(platforms)
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UploadError::UnknownPlatform(s.to_string()))
    }
}

/// Byte-size ceiling and accepted formats for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    pub max_bytes: u64,
    /// Lowercase extensions without the dot.
    pub extensions: &'static [&'static str],
}

impl PlatformLimits {
    /// Checks a located file against these limits without touching the network.
    pub fn check(&self, platform: PlatformId, video: &VideoFile) -> Result<(), UploadError> {
        if !self.extensions.contains(&video.extension()) {
            return Err(UploadError::ValidationFailed(format!(
                "{} does not accept .{} files",
                platform,
                video.extension()
            )));
        }
        if video.size() > self.max_bytes {
            return Err(UploadError::ValidationFailed(format!(
                "{} is {}, which exceeds the {} limit of {}",
                video.name(),
                files::format_file_size(video.size()),
                platform,
                files::format_file_size(self.max_bytes)
            )));
        }
        Ok(())
    }
}

/// Who can see an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Unlisted,
    #[default]
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Unlisted => "unlisted",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "unlisted" => Ok(Self::Unlisted),
            "public" => Ok(Self::Public),
            other => Err(format!(
                "unknown visibility '{other}' (expected private, unlisted, or public)"
            )),
        }
    }
}

/// Metadata shared by every file of a batch.
///
/// Every field is optional; an uploader fills the gaps from its configured
/// [`VideoDefaults`](crate::config::VideoDefaults):
///
/// * `title`, `description`: `DEFAULT_VIDEO_TITLE`, `DEFAULT_VIDEO_DESCRIPTION`
/// * `tags`: `DEFAULT_VIDEO_TAGS` split on commas
/// * `category_id`: `"22"` (People & Blogs)
/// * `visibility`: [`Visibility::Public`], except that scheduling always forces
///   [`Visibility::Unlisted`]
/// * `made_for_kids`: `false`
/// * `account`: the first configured account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
    pub visibility: Option<Visibility>,
    pub made_for_kids: Option<bool>,
    pub account: Option<AccountId>,
}

/// What happened to one file on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Uploaded {
        remote_id: String,
        url: String,
        /// The account the file went to, on platforms that have several.
        #[serde(skip_serializing_if = "Option::is_none")]
        account: Option<AccountId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        scheduled_time: Option<Timestamp>,
    },
    /// Dry run only: the file passed validation and nothing was sent.
    Validated {
        #[serde(skip_serializing_if = "Option::is_none")]
        scheduled_time: Option<Timestamp>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub platform: PlatformId,
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl UploadResult {
    pub fn failed(platform: PlatformId, path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        Self {
            platform,
            path: path.into(),
            outcome: Outcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Identity of the account behind a platform connection, as returned by a connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub channel_id: String,
    pub title: String,
}

/// A platform the orchestrator can dispatch batches to.
///
/// Implementations never fail a whole batch because of one file: per-file problems come back as
/// [`Outcome::Failed`] entries, one per input file and in input order. A batch-level `Err` is for
/// problems that affect every file equally, such as an unknown account.
#[async_trait]
pub trait PlatformUploader: Send + Sync {
    fn platform(&self) -> PlatformId;

    fn limits(&self) -> PlatformLimits {
        self.platform().limits()
    }

    async fn upload_batch(
        &self,
        files: &[VideoFile],
        options: &UploadOptions,
    ) -> Result<Vec<UploadResult>, UploadError>;

    /// Uploads every file for publication at `at`. See the implementation for how the platform
    /// realises the deferred publish.
    async fn schedule_batch(
        &self,
        files: &[VideoFile],
        at: Timestamp,
        options: &UploadOptions,
    ) -> Result<Vec<UploadResult>, UploadError>;

    /// Best-effort liveness check; `None` on any failure.
    async fn probe(&self, account: Option<&AccountId>) -> Option<AccountInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::tests::touch;

    #[test]
    fn platform_names_parse_case_insensitively() {
        assert_eq!("YouTube".parse::<PlatformId>().unwrap(), PlatformId::YouTube);
        assert_eq!(" facebook ".parse::<PlatformId>().unwrap(), PlatformId::Facebook);
        assert!(matches!(
            "tiktok".parse::<PlatformId>(),
            Err(UploadError::UnknownPlatform(name)) if name == "tiktok"
        ));
    }

    #[test]
    fn platform_lists_dedupe_and_expand_all() {
        assert_eq!(
            PlatformId::parse_list("instagram, youtube,instagram").unwrap(),
            vec![PlatformId::Instagram, PlatformId::YouTube]
        );
        assert_eq!(
            PlatformId::parse_list("all").unwrap(),
            vec![PlatformId::YouTube]
        );
        assert!(PlatformId::parse_list("").unwrap().is_empty());
        assert!(PlatformId::parse_list("youtube,vimeo").is_err());
    }

    #[test]
    fn limits_reject_oversized_and_foreign_formats() {
        let dir = tempfile::tempdir().unwrap();
        let small = files::resolve(touch(dir.path(), "small.mkv", 10 * MIB)).unwrap();
        let big = files::resolve(touch(dir.path(), "big.mp4", 300 * MIB)).unwrap();

        let youtube = PlatformId::YouTube.limits();
        assert!(youtube.check(PlatformId::YouTube, &small).is_ok());
        let err = youtube.check(PlatformId::YouTube, &big).unwrap_err();
        assert!(matches!(err, UploadError::ValidationFailed(_)));
        assert!(err.to_string().contains("256 MB"), "{err}");

        let instagram = PlatformId::Instagram.limits();
        assert!(matches!(
            instagram.check(PlatformId::Instagram, &small),
            Err(UploadError::ValidationFailed(_))
        ));
        assert!(PlatformId::Facebook.limits().check(PlatformId::Facebook, &big).is_ok());
    }

    #[test]
    fn visibility_round_trips_through_text() {
        for v in [Visibility::Private, Visibility::Unlisted, Visibility::Public] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
            assert_eq!(serde_json::to_value(v).unwrap(), v.as_str());
        }
        assert!("hidden".parse::<Visibility>().is_err());
        assert_eq!(Visibility::default(), Visibility::Public);
    }

    #[test]
    fn failed_results_report_their_error() {
        let result = UploadResult::failed(PlatformId::Instagram, "/tmp/a.mp4", "nope");
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("nope"));

        let ok = UploadResult {
            platform: PlatformId::YouTube,
            path: "/tmp/a.mp4".into(),
            outcome: Outcome::Validated {
                scheduled_time: None,
            },
        };
        assert!(ok.is_success());
        assert_eq!(ok.error(), None);
    }
}
