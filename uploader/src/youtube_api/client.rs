//! Core YouTube API client functionality and authentication management.

use crate::oauth::{OAuthManager, TimeBoundAccessToken};
use crate::youtube_api::{
    channels::{Channel, ChannelListResponse},
    playlist_items::PlaylistItemListResponse,
    videos::{Video, VideoListResponse, VideoStatusUpdate, VideoUpload},
};
use eyre::Context;
use http::Method;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// YouTube accepts any video subtype here and sniffs the container itself.
const VIDEO_CONTENT_TYPE: &str = "video/*";

/// Client for interacting with the YouTube Data API v3 on behalf of one account.
///
/// The client holds the account's refresh token and exchanges it for an access token before
/// the first call, and again whenever the access token is about to expire.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    /// OAuth manager for refreshing tokens (shared across clients)
    oauth_manager: Arc<OAuthManager>,
    /// HTTP client for API requests (shared across clients)
    client: reqwest::Client,
}

impl YouTubeClient {
    pub(crate) fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
        }
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self))]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired(SystemTime::now()) {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                return Err(eyre::eyre!("Unable to refresh expired access token"));
            }
        }

        Ok(token.access_token().to_string())
    }

    /// Makes an authenticated HTTP request to the YouTube API with common error handling.
    ///
    /// Ensures the token is fresh, sets the authorization header, attaches query parameters and
    /// an optional JSON body, and turns non-success statuses into errors carrying the response
    /// text.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query_params: Option<&[(&str, &str)]>,
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&access_token);

        if let Some(params) = query_params {
            request = request.query(params);
        }

        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        ensure_success(&method, response).await
    }

    /// Checks that the token can be refreshed and used by making a minimal `channels.list`
    /// call.
    ///
    /// Returns the authenticated account's channel, or `None` if the account has none.
    #[instrument(skip(self))]
    pub async fn my_channel(&self) -> eyre::Result<Option<Channel>> {
        let url = format!("{API_BASE}/channels");
        let query_params = [
            ("part", "id,snippet,contentDetails"),
            ("mine", "true"),
            ("maxResults", "1"),
        ];

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;

        let mut channels: ChannelListResponse = response
            .json()
            .await
            .context("parse YouTube channels API response as JSON")?;

        tracing::debug!(
            total_results = channels.page_info.total_results,
            returned_items = channels.items.len(),
            "fetched own channel"
        );

        Ok(channels.items.pop_front())
    }

    /// Uploads a video file together with its metadata.
    ///
    /// Uses the resumable upload protocol: the metadata is POSTed to open an upload session,
    /// whose URL comes back in the `Location` header, and the file is then streamed to that URL
    /// in a single PUT.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/guides/using_resumable_upload_protocol>
    #[instrument(skip(self, metadata), fields(path = %path.display()))]
    pub async fn insert_video(&self, path: &Path, metadata: &VideoUpload) -> eyre::Result<Video> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("open {}", path.display()))?;
        let size = file
            .metadata()
            .await
            .with_context(|| format!("stat {}", path.display()))?
            .len();

        let access_token = self.fresh_access_token().await?;

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&access_token)
            .header("X-Upload-Content-Length", size)
            .header("X-Upload-Content-Type", VIDEO_CONTENT_TYPE)
            .json(metadata)
            .send()
            .await
            .context("start resumable upload session")?;
        let response = ensure_success(&Method::POST, response).await?;

        let session_url = response
            .headers()
            .get(LOCATION)
            .ok_or_else(|| eyre::eyre!("upload session response has no Location header"))?
            .to_str()
            .context("upload session URL is not valid UTF-8")?
            .to_string();

        tracing::debug!(size, "upload session opened, sending video body");

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&access_token)
            .header(CONTENT_LENGTH, size)
            .header(CONTENT_TYPE, VIDEO_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .context("send video body")?;
        let response = ensure_success(&Method::PUT, response).await?;

        let video: Video = response
            .json()
            .await
            .context("parse YouTube upload response as JSON")?;

        tracing::debug!(video_id = video.id, "video uploaded");

        Ok(video)
    }

    /// Updates the `status` part of a video.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/update>
    #[instrument(skip(self))]
    pub async fn update_video_status(&self, update: &VideoStatusUpdate) -> eyre::Result<Video> {
        let url = format!("{API_BASE}/videos");
        let query_params = [("part", "status")];

        let response = self
            .make_authenticated_request(Method::PUT, &url, Some(&query_params), Some(update))
            .await?;

        let video: Video = response
            .json()
            .await
            .context("parse YouTube videos.update response as JSON")?;

        tracing::debug!(video_id = video.id, "updated video status");

        Ok(video)
    }

    /// Fetches snippet and status for up to 50 videos by id.
    ///
    /// Ids that do not exist (or are not visible to the account) are simply absent from the
    /// result.
    #[instrument(skip(self), fields(requested = ids.len()))]
    pub async fn get_videos(&self, ids: &[String]) -> eyre::Result<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{API_BASE}/videos");
        let ids = ids.join(",");
        let query_params = [("part", "snippet,status"), ("id", ids.as_str())];

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;

        let videos: VideoListResponse = response
            .json()
            .await
            .context("parse YouTube videos API response as JSON")?;

        tracing::debug!(
            returned_items = videos.items.len(),
            "fetched videos by id"
        );

        Ok(videos.items.into())
    }

    /// Returns up to `max_results` (at most 50) of the account's most recent uploads.
    #[instrument(skip(self))]
    pub async fn list_my_uploads(&self, max_results: u32) -> eyre::Result<Vec<Video>> {
        let Some(channel) = self.my_channel().await? else {
            tracing::debug!("account has no channel, so no uploads");
            return Ok(Vec::new());
        };
        let Some(playlist) = channel
            .content_details
            .and_then(|d| d.related_playlists.uploads)
        else {
            return Ok(Vec::new());
        };

        let url = format!("{API_BASE}/playlistItems");
        let max_results = max_results.clamp(1, 50).to_string();
        let query_params = [
            ("part", "contentDetails"),
            ("playlistId", playlist.as_str()),
            ("maxResults", max_results.as_str()),
        ];

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;

        let items: PlaylistItemListResponse = response
            .json()
            .await
            .context("parse YouTube playlistItems API response as JSON")?;

        tracing::debug!(
            total_results = items.page_info.total_results,
            returned_items = items.items.len(),
            "fetched uploads playlist"
        );

        let ids: Vec<String> = items
            .items
            .into_iter()
            .map(|item| item.content_details.video_id)
            .collect();
        self.get_videos(&ids).await
    }
}

async fn ensure_success(method: &Method, response: reqwest::Response) -> eyre::Result<reqwest::Response> {
    let status_code = response.status();
    if !status_code.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(eyre::eyre!(
            "YouTube API {} request failed with status {}: {}",
            method,
            status_code,
            error_text
        ));
    }
    Ok(response)
}
