//! HTTP interface for the browser UI.
//!
//! Every handler is a thin translation between JSON (or multipart) and the library: files come
//! from [`crate::files`], uploads go through the [`Orchestrator`].

use crate::config::{AccountId, Config};
use crate::error::UploadError;
use crate::files::{self, SUPPORTED_VIDEO_EXTENSIONS};
use crate::orchestrator::{BatchRequest, Orchestrator};
use crate::platform::{Outcome, PlatformId, UploadOptions, Visibility};
use crate::schedule::parse_schedule_time;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("index.html");

/// Largest accepted video upload.
pub const MAX_UPLOAD_BYTES: u64 = 256 * 1024 * 1024;
/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Shared state of the web server.
#[derive(Debug)]
pub struct AppState {
    videos_dir: PathBuf,
    /// `None` when the uploaders could not be initialized; uploads then answer 500.
    orchestrator: Option<Arc<Orchestrator>>,
    accounts: Vec<AccountId>,
}

impl AppState {
    pub fn new(config: &Config, orchestrator: Option<Orchestrator>) -> Self {
        Self {
            videos_dir: config.videos_dir.clone(),
            orchestrator: orchestrator.map(Arc::new),
            accounts: config.youtube_accounts(),
        }
    }

    fn safe_video_path(&self, filename: &str) -> Result<PathBuf, ApiError> {
        let mut components = std::path::Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.videos_dir.join(name)),
            _ => {
                tracing::warn!(filename, "rejected path outside the videos directory");
                Err(ApiError::new(StatusCode::FORBIDDEN, "Access denied"))
            }
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.to_string())
    }

    fn internal(message: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/videos", get(list_videos))
        .route("/api/videos/{filename}", delete(delete_video))
        .route("/api/videos/{filename}/metadata", get(video_metadata))
        .route(
            "/api/upload",
            post(upload_video).layer(DefaultBodyLimit::max(
                (MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD) as usize,
            )),
        )
        .route("/api/schedule", post(schedule))
        .route("/api/status", get(status))
        .route("/api/youtube-accounts", get(youtube_accounts))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn list_videos(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<files::VideoFile>>> {
    tokio::fs::create_dir_all(&state.videos_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load videos: {e}")))?;
    let videos = files::scan_directory(&state.videos_dir)
        .map_err(|e| ApiError::internal(format!("Failed to load videos: {e}")))?;
    tracing::debug!(found = videos.len(), "listed videos");
    Ok(Json(videos))
}

/// The `<stem>_metadata.json` file stored next to a video, if any.
async fn video_metadata(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let video = state.safe_video_path(&filename)?;
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = video.with_file_name(format!("{stem}_metadata.json"));

    let raw = match tokio::fs::read_to_string(&sidecar).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::new(StatusCode::NOT_FOUND, "No metadata found"));
        }
        Err(e) => return Err(ApiError::internal(e)),
    };
    let metadata = serde_json::from_str(&raw)
        .map_err(|e| ApiError::internal(format!("Invalid metadata file: {e}")))?;
    Ok(Json(metadata))
}

#[derive(Debug, Serialize)]
struct Uploaded {
    message: &'static str,
    video: files::VideoFile,
}

async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Uploaded>> {
    let too_large = || ApiError::bad_request("File too large. Maximum size is 256MB.");
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            ApiError::bad_request(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("video") {
            continue;
        }
        let Some(original) = field.file_name().map(str::to_string) else {
            return Err(ApiError::bad_request("No file uploaded"));
        };
        // never trust directories in a client-supplied name
        let original = std::path::Path::new(&original);
        let Some(stem) = original.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return Err(ApiError::bad_request("No file uploaded"));
        };
        if files::supported_extension(original).is_none() {
            let extension = original
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            let allowed: Vec<_> = SUPPORTED_VIDEO_EXTENSIONS
                .iter()
                .map(|e| format!(".{e}"))
                .collect();
            return Err(ApiError::bad_request(format!(
                "File type {extension} not supported. Allowed types: {}",
                allowed.join(", ")
            )));
        }
        let extension = original
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        tokio::fs::create_dir_all(&state.videos_dir)
            .await
            .map_err(ApiError::internal)?;
        let millis = jiff::Timestamp::now().as_millisecond();
        let target = state
            .videos_dir
            .join(format!("{stem}_{millis}.{extension}"));

        let mut out = tokio::fs::File::create(&target)
            .await
            .map_err(ApiError::internal)?;
        let mut written = 0u64;
        let copied: ApiResult<()> = async {
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                written += chunk.len() as u64;
                if written > MAX_UPLOAD_BYTES {
                    return Err(too_large());
                }
                out.write_all(&chunk).await.map_err(ApiError::internal)?;
            }
            out.flush().await.map_err(ApiError::internal)
        }
        .await;
        drop(out);

        if let Err(e) = copied {
            if let Err(rm) = tokio::fs::remove_file(&target).await {
                tracing::warn!(path = %target.display(), "could not remove partial upload: {rm}");
            }
            return Err(e);
        }

        let video = files::resolve(&target).map_err(ApiError::bad_request)?;
        tracing::info!(
            file = video.name(),
            size = %files::format_file_size(video.size()),
            "stored uploaded video"
        );
        return Ok(Json(Uploaded {
            message: "File uploaded successfully",
            video,
        }));
    }

    Err(ApiError::bad_request("No file uploaded"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    video_path: Option<String>,
    #[serde(default)]
    platforms: Vec<String>,
    title: Option<String>,
    description: Option<String>,
    /// Free text such as `"#fun, #cats travel"`.
    hashtags: Option<String>,
    /// Publish time per platform name; empty strings mean "now".
    #[serde(default)]
    schedules: BTreeMap<String, String>,
    youtube_account: Option<String>,
    made_for_kids: Option<bool>,
    privacy: Option<Visibility>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_time: Option<jiff::Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl PlatformResponse {
    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ScheduleResponse {
    results: BTreeMap<PlatformId, PlatformResponse>,
}

/// Splits free-form hashtag input on commas, whitespace, and `#`.
pub fn split_hashtags(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == '#' || c.is_whitespace())
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn schedule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<ScheduleResponse>> {
    let Some(orchestrator) = state.orchestrator.as_ref() else {
        return Err(ApiError::internal(
            "Uploaders not initialized. Please check your credentials.",
        ));
    };

    let video_path = non_blank(request.video_path);
    let (Some(video_path), false) = (video_path, request.platforms.is_empty()) else {
        return Err(ApiError::bad_request("Video path and platforms are required"));
    };

    let platforms = request
        .platforms
        .iter()
        .map(|p| p.parse::<PlatformId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::bad_request)?;

    let mut platform_schedules = BTreeMap::new();
    for (platform, at) in &request.schedules {
        if at.trim().is_empty() {
            continue;
        }
        let platform: PlatformId = platform.parse().map_err(ApiError::bad_request)?;
        let at = parse_schedule_time(at).map_err(ApiError::bad_request)?;
        platform_schedules.insert(platform, at);
    }

    let account = non_blank(request.youtube_account)
        .map(|a| a.parse::<AccountId>())
        .transpose()
        .map_err(ApiError::bad_request)?;

    // bare names refer to the videos directory
    let path = PathBuf::from(&video_path);
    let path = if path.is_absolute() {
        path
    } else {
        state.videos_dir.join(path)
    };
    let video = match files::resolve(&path) {
        Ok(video) => video,
        Err(e) => {
            tracing::warn!(path = %path.display(), "cannot schedule: {e}");
            let results = platforms
                .into_iter()
                .map(|platform| (platform, PlatformResponse::failed(e.to_string())))
                .collect();
            return Ok(Json(ScheduleResponse { results }));
        }
    };

    let tags = request
        .hashtags
        .as_deref()
        .map(split_hashtags)
        .filter(|tags| !tags.is_empty());

    let batch = BatchRequest {
        files: vec![video],
        platforms,
        options: UploadOptions {
            title: non_blank(request.title),
            description: non_blank(request.description),
            tags,
            category_id: None,
            visibility: request.privacy,
            made_for_kids: request.made_for_kids,
            account,
        },
        dry_run: false,
        scheduled_time: None,
        platform_schedules,
    };

    let report = orchestrator.run(&batch).await;

    let results = report
        .results
        .into_iter()
        .filter_map(|(platform, mut results)| {
            let result = results.pop()?;
            let response = match result.outcome {
                Outcome::Uploaded {
                    remote_id,
                    url,
                    account,
                    scheduled_time,
                } => PlatformResponse {
                    success: true,
                    video_id: Some(remote_id),
                    url: Some(url),
                    scheduled_time,
                    account,
                    error: None,
                },
                Outcome::Validated { scheduled_time } => PlatformResponse {
                    success: true,
                    scheduled_time,
                    ..Default::default()
                },
                Outcome::Failed { error } => PlatformResponse::failed(error),
            };
            Some((platform, response))
        })
        .collect();

    Ok(Json(ScheduleResponse { results }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    youtube: bool,
    youtube_accounts: Vec<AccountId>,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let youtube = match &state.orchestrator {
        Some(orchestrator) => orchestrator.probe(PlatformId::YouTube, None).await.is_some(),
        None => false,
    };
    Json(StatusResponse {
        youtube,
        youtube_accounts: state.accounts.clone(),
    })
}

async fn youtube_accounts(State(state): State<Arc<AppState>>) -> Json<Vec<AccountId>> {
    Json(state.accounts.clone())
}

async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let path = state.safe_video_path(&filename)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "deleted video");
            Ok(Json(
                serde_json::json!({ "message": "File deleted successfully" }),
            ))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            UploadError::NotFound(path).to_string(),
        )),
        Err(e) => Err(ApiError::internal(format!("Deletion failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::tests::touch;
    use crate::uploader::tests::{FakeApi, uploader_with};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct TestServer {
        dir: tempfile::TempDir,
        api: Arc<FakeApi>,
        app: Router,
    }

    impl TestServer {
        fn videos_dir(&self) -> PathBuf {
            self.dir.path().join("videos")
        }
    }

    fn config(dir: &std::path::Path, with_credentials: bool) -> Config {
        let videos = dir.join("videos").display().to_string();
        Config::from_lookup(move |key| match key {
            "VIDEOS_DIR" => Some(videos.clone()),
            "YOUTUBE_CLIENT_ID" if with_credentials => Some("id".to_string()),
            "YOUTUBE_CLIENT_SECRET" if with_credentials => Some("secret".to_string()),
            "YOUTUBE_REFRESH_TOKEN_A" if with_credentials => Some("token".to_string()),
            _ => None,
        })
    }

    fn server() -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("videos")).unwrap();
        let api = Arc::new(FakeApi::default());
        let orchestrator =
            Orchestrator::new().with_uploader(Arc::new(uploader_with(Arc::clone(&api))));
        let app = router(AppState::new(&config(dir.path(), true), Some(orchestrator)));
        TestServer { dir, api, app }
    }

    fn degraded_server() -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let app = router(AppState::new(&config(dir.path(), false), None));
        TestServer {
            dir,
            api: Arc::new(FakeApi::default()),
            app,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn multipart_request(file_name: &str, contents: &[u8]) -> Request<Body> {
        let boundary = "X-TEST-BOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{file_name}\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn serves_the_index_page() {
        let server = server();
        let response = server.app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("<html"));
    }

    #[tokio::test]
    async fn lists_videos_creating_the_directory() {
        let server = degraded_server();
        assert!(!server.videos_dir().exists());

        let (status, json) = send(&server.app, get("/api/videos")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
        assert!(server.videos_dir().is_dir());

        touch(&server.videos_dir(), "clip.mp4", 5);
        touch(&server.videos_dir(), "notes.txt", 5);
        let (_, json) = send(&server.app, get("/api/videos")).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["name"], "clip.mp4");
        assert_eq!(json[0]["extension"], ".mp4");
    }

    #[tokio::test]
    async fn delete_refuses_paths_outside_the_videos_directory() {
        let server = server();
        let secret = server.dir.path().join("secret.txt");
        std::fs::write(&secret, "keep me").unwrap();

        for uri in [
            "/api/videos/..%2Fsecret.txt",
            "/api/videos/..",
            "/api/videos/%2Fetc%2Fpasswd",
        ] {
            let request = Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, json) = send(&server.app, request).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(json["error"], "Access denied");
        }
        assert_eq!(std::fs::read_to_string(&secret).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn delete_removes_videos_and_reports_missing_ones() {
        let server = server();
        let clip = touch(&server.videos_dir(), "clip.mp4", 5);
        let delete = |uri: &str| {
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };

        let (status, json) = send(&server.app, delete("/api/videos/clip.mp4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "File deleted successfully");
        assert!(!clip.exists());

        let (status, _) = send(&server.app, delete("/api/videos/clip.mp4")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_metadata_sidecars() {
        let server = server();
        touch(&server.videos_dir(), "clip.mp4", 5);
        std::fs::write(
            server.videos_dir().join("clip_metadata.json"),
            r#"{"title": "From sidecar", "tags": ["a"]}"#,
        )
        .unwrap();

        let (status, json) = send(&server.app, get("/api/videos/clip.mp4/metadata")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "From sidecar");

        let (status, _) = send(&server.app, get("/api/videos/other.mp4/metadata")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&server.app, get("/api/videos/..%2Fclip.mp4/metadata")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn upload_stores_with_a_timestamp_suffix() {
        let server = server();
        let (status, json) = send(&server.app, multipart_request("my clip.mp4", b"fake video")).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "File uploaded successfully");
        assert_eq!(json["video"]["size"], 10);

        let name = json["video"]["name"].as_str().unwrap();
        let millis = name
            .strip_prefix("my clip_")
            .and_then(|rest| rest.strip_suffix(".mp4"))
            .unwrap();
        assert!(millis.chars().all(|c| c.is_ascii_digit()), "{name}");
        assert!(server.videos_dir().join(name).is_file());
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_types_before_writing() {
        let server = server();
        let (status, json) = send(&server.app, multipart_request("notes.txt", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains(".txt"), "{json}");
        assert_eq!(std::fs::read_dir(server.videos_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_over_the_limit_is_rejected_and_discarded() {
        use tokio::io::AsyncReadExt;
        use tokio_util::io::ReaderStream;

        let server = server();
        let boundary = "X-TEST-BOUNDARY";
        let head = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"big.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"
        );
        let tail = format!("\r\n--{boundary}--\r\n");
        let payload = std::io::Cursor::new(head.into_bytes())
            .chain(tokio::io::repeat(0).take(MAX_UPLOAD_BYTES + 1))
            .chain(std::io::Cursor::new(tail.into_bytes()));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from_stream(ReaderStream::new(payload)))
            .unwrap();

        let (status, json) = send(&server.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("File too large"), "{json}");
        assert_eq!(std::fs::read_dir(server.videos_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn schedule_uploads_and_reports_per_platform() {
        let server = server();
        touch(&server.videos_dir(), "clip.mp4", 5);

        let (status, json) = send(
            &server.app,
            json_request(
                Method::POST,
                "/api/schedule",
                serde_json::json!({
                    "videoPath": "clip.mp4",
                    "platforms": ["youtube", "instagram"],
                    "title": "",
                    "hashtags": "#fun, #cats travel",
                    "schedules": { "youtube": "2030-01-15T10:30:00Z", "instagram": "" },
                    "privacy": "public",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");

        let youtube = &json["results"]["youtube"];
        assert_eq!(youtube["success"], true);
        assert_eq!(youtube["videoId"], "vid1");
        assert_eq!(youtube["url"], "https://www.youtube.com/watch?v=vid1");
        assert_eq!(youtube["scheduledTime"], "2030-01-15T10:30:00Z");
        assert_eq!(youtube["account"], "A");

        let instagram = &json["results"]["instagram"];
        assert_eq!(instagram["success"], false);
        assert!(instagram["error"].as_str().unwrap().contains("instagram"));

        let inserts = server.api.inserts.lock().unwrap();
        let metadata = &inserts[0].1;
        assert_eq!(metadata.snippet.title, crate::config::DEFAULT_TITLE);
        assert_eq!(metadata.snippet.tags, ["fun", "cats", "travel"]);
        assert_eq!(metadata.status.privacy_status, Some(Visibility::Unlisted));
    }

    #[tokio::test]
    async fn schedule_rejects_bad_requests() {
        let server = server();
        let clip = touch(&server.videos_dir(), "clip.mp4", 5);
        let clip = clip.display().to_string();

        for (body, expected) in [
            (serde_json::json!({ "platforms": ["youtube"] }), "required"),
            (serde_json::json!({ "videoPath": clip, "platforms": [] }), "required"),
            (
                serde_json::json!({ "videoPath": clip, "platforms": ["tiktok"] }),
                "unknown platform",
            ),
            (
                serde_json::json!({
                    "videoPath": clip,
                    "platforms": ["youtube"],
                    "schedules": { "youtube": "next tuesday" },
                }),
                "invalid schedule time",
            ),
        ] {
            let (status, json) =
                send(&server.app, json_request(Method::POST, "/api/schedule", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
            let error = json["error"].as_str().unwrap();
            assert!(error.contains(expected), "{error}");
        }
        assert_eq!(server.api.insert_count(), 0);
    }

    #[tokio::test]
    async fn unusable_files_fail_on_every_requested_platform() {
        let server = server();
        touch(&server.videos_dir(), "notes.txt", 5);

        for (video_path, expected) in [
            ("notes.txt", "unsupported video format"),
            ("missing.mp4", "not found"),
        ] {
            let (status, json) = send(
                &server.app,
                json_request(
                    Method::POST,
                    "/api/schedule",
                    serde_json::json!({
                        "videoPath": video_path,
                        "platforms": ["youtube", "instagram"],
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{json}");
            for platform in ["youtube", "instagram"] {
                let result = &json["results"][platform];
                assert_eq!(result["success"], false, "{json}");
                let error = result["error"].as_str().unwrap();
                assert!(error.contains(expected), "{error}");
            }
        }
        assert_eq!(server.api.insert_count(), 0);
    }

    #[tokio::test]
    async fn schedule_without_credentials_is_a_server_error() {
        let server = degraded_server();
        let (status, json) = send(
            &server.app,
            json_request(
                Method::POST,
                "/api/schedule",
                serde_json::json!({ "videoPath": "clip.mp4", "platforms": ["youtube"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("not initialized"));
    }

    #[tokio::test]
    async fn status_reflects_the_probe() {
        let (status, json) = send(&server().app, get("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "youtube": true, "youtubeAccounts": ["A"] }));

        let (_, json) = send(&degraded_server().app, get("/api/status")).await;
        assert_eq!(json, serde_json::json!({ "youtube": false, "youtubeAccounts": [] }));

        let (_, json) = send(&server().app, get("/api/youtube-accounts")).await;
        assert_eq!(json, serde_json::json!(["A"]));
    }

    #[test]
    fn hashtags_split_on_commas_spaces_and_hashes() {
        assert_eq!(
            split_hashtags("#fun,#cats  travel,, #"),
            ["fun", "cats", "travel"]
        );
        assert!(split_hashtags("  ").is_empty());
    }
}
