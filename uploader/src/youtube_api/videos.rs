//! YouTube Videos API types.

use crate::platform::Visibility;
use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// The value will be `youtube#videoListResponse`.
    pub kind: String,
    #[serde(default)]
    pub items: VecDeque<Video>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

/// A `video` resource represents a YouTube video.
///
/// Which parts are present depends on the `part` parameter of the request that produced it.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
}

impl Video {
    /// Public watch URL for a video id.
    pub fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={id}")
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.status.as_ref().and_then(|s| s.privacy_status)
    }
}

/// Basic details about a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Set by YouTube; never sent.
    #[serde(skip_serializing)]
    pub published_at: Option<Timestamp>,
}

/// Upload, processing, and privacy status of a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#status>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<Visibility>,
    /// The channel owner's own "made for kids" designation. This is the writable field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_declared_made_for_kids: Option<bool>,
    /// YouTube's effective designation. Read-only.
    #[serde(skip_serializing)]
    pub made_for_kids: Option<bool>,
    /// e.g. `uploaded`, `processed`, `rejected`. Read-only.
    #[serde(skip_serializing)]
    pub upload_status: Option<String>,
}

/// The resource sent as metadata when starting a `videos.insert` upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoUpload {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

/// Request body for `videos.update` with `part=status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStatusUpdate {
    pub id: String,
    pub status: VideoStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_metadata_uses_api_field_names() {
        let upload = VideoUpload {
            snippet: VideoSnippet {
                title: "Title".to_string(),
                description: "Desc".to_string(),
                tags: vec!["a".to_string()],
                category_id: Some("22".to_string()),
                published_at: None,
            },
            status: VideoStatus {
                privacy_status: Some(Visibility::Unlisted),
                self_declared_made_for_kids: Some(false),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&upload).unwrap(),
            serde_json::json!({
                "snippet": {
                    "title": "Title",
                    "description": "Desc",
                    "tags": ["a"],
                    "categoryId": "22"
                },
                "status": {
                    "privacyStatus": "unlisted",
                    "selfDeclaredMadeForKids": false
                }
            })
        );
    }

    #[test]
    fn status_update_sends_only_what_changes() {
        let update = VideoStatusUpdate {
            id: "abc".to_string(),
            status: VideoStatus {
                self_declared_made_for_kids: Some(true),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "id": "abc", "status": { "selfDeclaredMadeForKids": true } })
        );
    }

    #[test]
    fn parses_list_response() {
        let json = serde_json::json!({
            "kind": "youtube#videoListResponse",
            "pageInfo": { "totalResults": 1, "resultsPerPage": 1 },
            "items": [{
                "kind": "youtube#video",
                "id": "abc",
                "snippet": {
                    "title": "Clip",
                    "description": "",
                    "publishedAt": "2024-01-15T10:30:00Z",
                    "categoryId": "22"
                },
                "status": {
                    "uploadStatus": "processed",
                    "privacyStatus": "private",
                    "madeForKids": false
                }
            }]
        });
        let response: VideoListResponse = serde_json::from_value(json).unwrap();
        let video = &response.items[0];
        assert_eq!(video.visibility(), Some(Visibility::Private));
        let snippet = video.snippet.as_ref().unwrap();
        assert!(snippet.tags.is_empty());
        assert_eq!(
            snippet.published_at,
            Some("2024-01-15T10:30:00Z".parse().unwrap())
        );
        assert_eq!(Video::watch_url("abc"), "https://www.youtube.com/watch?v=abc");
    }
}
