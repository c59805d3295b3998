//! YouTube Channels API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// The value will be `youtube#channelListResponse`.
    pub kind: String,
    /// Absent entirely when the account has no channel.
    #[serde(default)]
    pub items: VecDeque<Channel>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<ChannelContentDetails>,
}

/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedPlaylists {
    /// The playlist holding every video uploaded to the channel.
    pub uploads: Option<String>,
}
