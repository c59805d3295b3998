//! Upload semantics for YouTube on top of the wire client.

use crate::config::{AccountId, Config, VideoDefaults};
use crate::error::UploadError;
use crate::files::{self, VideoFile};
use crate::oauth::{OAuthManager, TimeBoundAccessToken};
use crate::platform::{
    AccountInfo, Outcome, PlatformId, PlatformLimits, PlatformUploader, UploadOptions,
    UploadResult, Visibility,
};
use crate::youtube_api::{
    Channel, Video, VideoSnippet, VideoStatus, VideoStatusUpdate, VideoUpload, YouTubeClient,
};
use async_trait::async_trait;
use eyre::Context;
use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How many of the account's uploads [`YouTubeUploader::list_by_visibility`] looks at.
const LIST_PAGE_SIZE: u32 = 50;

/// The YouTube operations the uploader relies on.
///
/// [`YouTubeClient`] is the real implementation.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn insert(&self, path: &Path, metadata: &VideoUpload) -> eyre::Result<Video>;
    async fn update_status(&self, update: &VideoStatusUpdate) -> eyre::Result<Video>;
    async fn list_uploads(&self, max_results: u32) -> eyre::Result<Vec<Video>>;
    async fn videos(&self, ids: &[String]) -> eyre::Result<Vec<Video>>;
    async fn channel(&self) -> eyre::Result<Option<Channel>>;
}

#[async_trait]
impl VideoApi for YouTubeClient {
    async fn insert(&self, path: &Path, metadata: &VideoUpload) -> eyre::Result<Video> {
        self.insert_video(path, metadata).await
    }

    async fn update_status(&self, update: &VideoStatusUpdate) -> eyre::Result<Video> {
        self.update_video_status(update).await
    }

    async fn list_uploads(&self, max_results: u32) -> eyre::Result<Vec<Video>> {
        self.list_my_uploads(max_results).await
    }

    async fn videos(&self, ids: &[String]) -> eyre::Result<Vec<Video>> {
        self.get_videos(ids).await
    }

    async fn channel(&self) -> eyre::Result<Option<Channel>> {
        self.my_channel().await
    }
}

/// A finished upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub remote_id: String,
    pub url: String,
    pub account: AccountId,
    /// The intended publish time, for scheduled uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<Timestamp>,
}

/// A condensed view of one of the account's videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub visibility: Option<Visibility>,
    pub made_for_kids: Option<bool>,
    pub published_at: Option<Timestamp>,
    pub url: String,
}

impl From<Video> for VideoSummary {
    fn from(video: Video) -> Self {
        let url = Video::watch_url(&video.id);
        let (title, published_at) = video
            .snippet
            .map(|s| (s.title, s.published_at))
            .unwrap_or_default();
        let (visibility, made_for_kids) = video
            .status
            .map(|s| (s.privacy_status, s.made_for_kids.or(s.self_declared_made_for_kids)))
            .unwrap_or_default();
        Self {
            id: video.id,
            title,
            visibility,
            made_for_kids,
            published_at,
            url,
        }
    }
}

/// Uploads videos to one or more YouTube accounts that share an OAuth client.
///
/// Each call uses the first configured account unless [`UploadOptions::account`] names another
/// one. Batches are strictly sequential and paced: successive attempts are separated by
/// `min_interval_between_calls`, whether or not the previous attempt succeeded.
pub struct YouTubeUploader {
    accounts: BTreeMap<AccountId, Arc<dyn VideoApi>>,
    default_account: AccountId,
    defaults: VideoDefaults,
    limits: PlatformLimits,
    min_interval_between_calls: Duration,
}

impl std::fmt::Debug for YouTubeUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeUploader")
            .field("accounts", &self.accounts.keys().collect::<Vec<_>>())
            .field("default_account", &self.default_account)
            .field("min_interval_between_calls", &self.min_interval_between_calls)
            .finish_non_exhaustive()
    }
}

impl YouTubeUploader {
    /// Builds one API client per configured account.
    ///
    /// No network traffic happens here; tokens are exchanged on first use.
    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        let credentials = config.youtube()?;
        let oauth_manager = OAuthManager::new(credentials.client.clone())
            .map_err(|e| UploadError::Configuration(format!("{e:#}")))?;
        let oauth_manager = Arc::new(oauth_manager);
        let http = reqwest::Client::builder()
            .build()
            .context("build YouTube API HTTP client")
            .map_err(|e| UploadError::Configuration(format!("{e:#}")))?;

        let accounts = credentials
            .accounts
            .iter()
            .map(|(id, secret)| {
                let client = YouTubeClient::new(
                    TimeBoundAccessToken::from_refresh_secret(secret),
                    Arc::clone(&oauth_manager),
                    http.clone(),
                );
                (id.clone(), Arc::new(client) as Arc<dyn VideoApi>)
            })
            .collect();

        Self::with_clients(accounts, config.defaults.clone(), config.upload_interval)
    }

    /// Builds an uploader over already constructed API clients, keyed by account.
    pub fn with_clients(
        accounts: BTreeMap<AccountId, Arc<dyn VideoApi>>,
        defaults: VideoDefaults,
        min_interval_between_calls: Duration,
    ) -> Result<Self, UploadError> {
        let default_account = accounts
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| UploadError::Configuration("no YouTube accounts configured".into()))?;
        Ok(Self {
            accounts,
            default_account,
            defaults,
            limits: PlatformId::YouTube.limits(),
            min_interval_between_calls,
        })
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.accounts.keys()
    }

    pub fn default_account(&self) -> &AccountId {
        &self.default_account
    }

    fn client(
        &self,
        account: Option<&AccountId>,
    ) -> Result<(&AccountId, &Arc<dyn VideoApi>), UploadError> {
        let account = account.unwrap_or(&self.default_account);
        self.accounts
            .get_key_value(account)
            .ok_or_else(|| UploadError::UnknownAccount(account.to_string()))
    }

    fn metadata(&self, options: &UploadOptions) -> VideoUpload {
        VideoUpload {
            snippet: VideoSnippet {
                title: options
                    .title
                    .clone()
                    .unwrap_or_else(|| self.defaults.title.clone()),
                description: options
                    .description
                    .clone()
                    .unwrap_or_else(|| self.defaults.description.clone()),
                tags: options
                    .tags
                    .clone()
                    .unwrap_or_else(|| self.defaults.tags.clone()),
                category_id: Some(
                    options
                        .category_id
                        .clone()
                        .unwrap_or_else(|| self.defaults.category_id.clone()),
                ),
                published_at: None,
            },
            status: VideoStatus {
                privacy_status: Some(options.visibility.unwrap_or_default()),
                self_declared_made_for_kids: Some(options.made_for_kids.unwrap_or(false)),
                ..Default::default()
            },
        }
    }

    /// Uploads one file.
    ///
    /// The size check happens before anything is sent; a file over the limit fails with
    /// [`UploadError::ValidationFailed`]. Rejections from the API come back as
    /// [`UploadError::Remote`] and are not retried.
    #[tracing::instrument(skip_all, fields(file = file.name()))]
    pub async fn upload(
        &self,
        file: &VideoFile,
        options: &UploadOptions,
    ) -> Result<UploadReceipt, UploadError> {
        self.limits.check(PlatformId::YouTube, file)?;
        let (account, api) = self.client(options.account.as_ref())?;
        let metadata = self.metadata(options);

        tracing::info!(
            size = %files::format_file_size(file.size()),
            %account,
            visibility = ?metadata.status.privacy_status,
            "starting YouTube upload"
        );

        let video = api.insert(file.path(), &metadata).await?;
        let url = Video::watch_url(&video.id);

        tracing::info!(video_id = video.id, url, "YouTube upload successful");

        Ok(UploadReceipt {
            remote_id: video.id,
            url,
            account: account.clone(),
            scheduled_time: None,
        })
    }

    /// Uploads each file in order, recording failures without stopping.
    ///
    /// Always returns exactly one result per input file, in input order.
    pub async fn upload_batch(
        &self,
        files: &[VideoFile],
        options: &UploadOptions,
    ) -> Vec<UploadResult> {
        self.paced(files, options, |file| self.upload(file, options))
            .await
    }

    /// Uploads now, for publishing later.
    ///
    /// YouTube has no way to publish an API upload at a given time, so the video is uploaded as
    /// [`Visibility::Unlisted`] whatever `options.visibility` says, and `at` is only echoed back.
    /// Nothing happens at `at`: the caller has to publish the video themselves then, e.g. with
    /// [`YouTubeUploader::set_visibility`].
    pub async fn schedule(
        &self,
        file: &VideoFile,
        at: Timestamp,
        options: &UploadOptions,
    ) -> Result<UploadReceipt, UploadError> {
        let options = UploadOptions {
            visibility: Some(Visibility::Unlisted),
            ..options.clone()
        };
        let mut receipt = self.upload(file, &options).await?;
        tracing::info!(
            video_id = receipt.remote_id,
            scheduled_time = %at,
            "uploaded as unlisted; it must be published manually at the scheduled time"
        );
        receipt.scheduled_time = Some(at);
        Ok(receipt)
    }

    /// [`YouTubeUploader::schedule`] for every file, paced like
    /// [`YouTubeUploader::upload_batch`].
    pub async fn schedule_batch(
        &self,
        files: &[VideoFile],
        at: Timestamp,
        options: &UploadOptions,
    ) -> Vec<UploadResult> {
        self.paced(files, options, |file| self.schedule(file, at, options))
            .await
    }

    async fn paced<'a, F, Fut>(
        &self,
        files: &'a [VideoFile],
        options: &UploadOptions,
        mut attempt: F,
    ) -> Vec<UploadResult>
    where
        F: FnMut(&'a VideoFile) -> Fut,
        Fut: Future<Output = Result<UploadReceipt, UploadError>>,
    {
        // an unknown account fails every file the same way; don't pace through that
        if let Err(e) = self.client(options.account.as_ref()) {
            tracing::warn!("{e}");
            return files
                .iter()
                .map(|file| UploadResult::failed(PlatformId::YouTube, file.path(), &e))
                .collect();
        }

        let mut results = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.min_interval_between_calls).await;
            }
            let outcome = match attempt(file).await {
                Ok(receipt) => Outcome::Uploaded {
                    remote_id: receipt.remote_id,
                    url: receipt.url,
                    account: Some(receipt.account),
                    scheduled_time: receipt.scheduled_time,
                },
                Err(e) => {
                    tracing::warn!(file = file.name(), "upload failed: {e}");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(UploadResult {
                platform: PlatformId::YouTube,
                path: file.path().to_path_buf(),
                outcome,
            });
        }
        results
    }

    /// Changes who can see an uploaded video; this is how a scheduled upload gets published.
    #[tracing::instrument(skip(self))]
    pub async fn set_visibility(
        &self,
        remote_id: &str,
        visibility: Visibility,
        account: Option<&AccountId>,
    ) -> Result<bool, UploadError> {
        let (_, api) = self.client(account)?;
        let update = VideoStatusUpdate {
            id: remote_id.to_string(),
            status: VideoStatus {
                privacy_status: Some(visibility),
                ..Default::default()
            },
        };
        api.update_status(&update).await?;
        tracing::info!(video_id = remote_id, %visibility, "video visibility updated");
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_made_for_kids(
        &self,
        remote_id: &str,
        made_for_kids: bool,
        account: Option<&AccountId>,
    ) -> Result<bool, UploadError> {
        let (_, api) = self.client(account)?;
        let update = VideoStatusUpdate {
            id: remote_id.to_string(),
            status: VideoStatus {
                self_declared_made_for_kids: Some(made_for_kids),
                ..Default::default()
            },
        };
        api.update_status(&update).await?;
        tracing::info!(video_id = remote_id, made_for_kids, "video audience updated");
        Ok(true)
    }

    /// The account's recent uploads (up to 50) that currently have the given visibility.
    ///
    /// YouTube cannot filter by privacy status server-side, so this filters what it fetched.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_visibility(
        &self,
        visibility: Visibility,
        account: Option<&AccountId>,
    ) -> Result<Vec<VideoSummary>, UploadError> {
        let (_, api) = self.client(account)?;
        let videos = api.list_uploads(LIST_PAGE_SIZE).await?;
        Ok(videos
            .into_iter()
            .filter(|v| v.visibility() == Some(visibility))
            .map(VideoSummary::from)
            .collect())
    }

    /// Looks up one video; `None` if the account cannot see it.
    #[tracing::instrument(skip(self))]
    pub async fn video_details(
        &self,
        remote_id: &str,
        account: Option<&AccountId>,
    ) -> Result<Option<VideoSummary>, UploadError> {
        let (_, api) = self.client(account)?;
        let videos = api.videos(&[remote_id.to_string()]).await?;
        Ok(videos.into_iter().next().map(VideoSummary::from))
    }

    /// Best-effort connectivity probe. Any failure is logged and yields `None`.
    pub async fn get_quota(&self, account: Option<&AccountId>) -> Option<AccountInfo> {
        let (account, api) = match self.client(account) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("YouTube probe skipped: {e}");
                return None;
            }
        };
        match api.channel().await {
            Ok(Some(channel)) => Some(AccountInfo {
                channel_id: channel.id,
                title: channel.snippet.map(|s| s.title).unwrap_or_default(),
            }),
            Ok(None) => {
                tracing::warn!(%account, "YouTube account has no channel");
                None
            }
            Err(e) => {
                tracing::warn!(%account, "YouTube probe failed: {e:#}");
                None
            }
        }
    }
}

#[async_trait]
impl PlatformUploader for YouTubeUploader {
    fn platform(&self) -> PlatformId {
        PlatformId::YouTube
    }

    fn limits(&self) -> PlatformLimits {
        self.limits
    }

    async fn upload_batch(
        &self,
        files: &[VideoFile],
        options: &UploadOptions,
    ) -> Result<Vec<UploadResult>, UploadError> {
        Ok(YouTubeUploader::upload_batch(self, files, options).await)
    }

    async fn schedule_batch(
        &self,
        files: &[VideoFile],
        at: Timestamp,
        options: &UploadOptions,
    ) -> Result<Vec<UploadResult>, UploadError> {
        Ok(YouTubeUploader::schedule_batch(self, files, at, options).await)
    }

    async fn probe(&self, account: Option<&AccountId>) -> Option<AccountInfo> {
        self.get_quota(account).await
    }
}
