//! Fans a batch of files out to the requested platforms and collects one report.

use crate::config::{AccountId, Config};
use crate::error::UploadError;
use crate::files::VideoFile;
use crate::platform::{AccountInfo, Outcome, PlatformId, PlatformUploader, UploadOptions, UploadResult};
use crate::uploader::YouTubeUploader;
use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One request to upload (or validate) a set of files on a set of platforms.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub files: Vec<VideoFile>,
    pub platforms: Vec<PlatformId>,
    pub options: UploadOptions,
    /// Validate against platform limits only; nothing is sent anywhere.
    pub dry_run: bool,
    /// Publish time for every platform without its own entry in `platform_schedules`.
    pub scheduled_time: Option<Timestamp>,
    pub platform_schedules: BTreeMap<PlatformId, Timestamp>,
}

impl BatchRequest {
    fn schedule_for(&self, platform: PlatformId) -> Option<Timestamp> {
        self.platform_schedules
            .get(&platform)
            .copied()
            .or(self.scheduled_time)
    }
}

/// Per-platform results of a batch, each in input file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub dry_run: bool,
    pub results: BTreeMap<PlatformId, Vec<UploadResult>>,
}

impl BatchReport {
    pub fn success_count(&self, platform: PlatformId) -> usize {
        self.results
            .get(&platform)
            .map_or(0, |results| results.iter().filter(|r| r.is_success()).count())
    }

    pub fn failure_count(&self, platform: PlatformId) -> usize {
        self.results
            .get(&platform)
            .map_or(0, |results| results.iter().filter(|r| !r.is_success()).count())
    }
}

/// Dispatches batches to the platform uploaders it was built with.
///
/// Platforms are processed one after the other. Nothing that goes wrong on one platform (or for
/// one file) escapes [`Orchestrator::run`]; it is recorded in the report instead.
#[derive(Default)]
pub struct Orchestrator {
    uploaders: BTreeMap<PlatformId, Arc<dyn PlatformUploader>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("platforms", &self.uploaders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator with every uploader the configuration supports (currently YouTube).
    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        let youtube = YouTubeUploader::from_config(config)?;
        tracing::info!(
            accounts = ?youtube.accounts().map(AccountId::as_str).collect::<Vec<_>>(),
            "YouTube uploader initialized"
        );
        Ok(Self::new().with_uploader(Arc::new(youtube)))
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn PlatformUploader>) -> Self {
        self.uploaders.insert(uploader.platform(), uploader);
        self
    }

    pub fn supports(&self, platform: PlatformId) -> bool {
        self.uploaders.contains_key(&platform)
    }

    #[tracing::instrument(skip_all, fields(
        files = batch.files.len(),
        platforms = ?batch.platforms,
        dry_run = batch.dry_run,
    ))]
    pub async fn run(&self, batch: &BatchRequest) -> BatchReport {
        let mut report = BatchReport {
            dry_run: batch.dry_run,
            results: BTreeMap::new(),
        };

        for &platform in &batch.platforms {
            let results = if batch.dry_run {
                self.validate(platform, batch)
            } else {
                self.dispatch(platform, batch).await
            };
            tracing::info!(
                %platform,
                succeeded = results.iter().filter(|r| r.is_success()).count(),
                failed = results.iter().filter(|r| !r.is_success()).count(),
                "platform finished"
            );
            report.results.insert(platform, results);
        }

        report
    }

    fn validate(&self, platform: PlatformId, batch: &BatchRequest) -> Vec<UploadResult> {
        let Some(uploader) = self.uploaders.get(&platform) else {
            return unsupported(platform, &batch.files);
        };
        let limits = uploader.limits();
        let scheduled_time = batch.schedule_for(platform);
        batch
            .files
            .iter()
            .map(|file| match limits.check(platform, file) {
                Ok(()) => UploadResult {
                    platform,
                    path: file.path().to_path_buf(),
                    outcome: Outcome::Validated { scheduled_time },
                },
                Err(e) => UploadResult::failed(platform, file.path(), e),
            })
            .collect()
    }

    async fn dispatch(&self, platform: PlatformId, batch: &BatchRequest) -> Vec<UploadResult> {
        let Some(uploader) = self.uploaders.get(&platform) else {
            tracing::warn!(%platform, "no uploader for platform");
            return unsupported(platform, &batch.files);
        };

        let results = match batch.schedule_for(platform) {
            Some(at) => {
                uploader
                    .schedule_batch(&batch.files, at, &batch.options)
                    .await
            }
            None => uploader.upload_batch(&batch.files, &batch.options).await,
        };

        match results {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(%platform, "platform batch failed: {e}");
                batch
                    .files
                    .iter()
                    .map(|file| UploadResult::failed(platform, file.path(), &e))
                    .collect()
            }
        }
    }

    /// Forwards to the platform's connectivity probe; `None` if the platform has no uploader.
    pub async fn probe(
        &self,
        platform: PlatformId,
        account: Option<&AccountId>,
    ) -> Option<AccountInfo> {
        self.uploaders.get(&platform)?.probe(account).await
    }
}

fn unsupported(platform: PlatformId, files: &[VideoFile]) -> Vec<UploadResult> {
    files
        .iter()
        .map(|file| {
            UploadResult::failed(
                platform,
                file.path(),
                format!("{platform} uploads are not supported by this installation"),
            )
        })
        .collect()
}
