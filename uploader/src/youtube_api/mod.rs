//! YouTube Data API v3 client library.
//!
//! Only the slice of the API an uploader needs is covered: inserting a video through a resumable
//! upload session, updating its status, and reading back the authenticated channel's uploads.
//!
//! # Listing uploads
//!
//! `videos.list` cannot enumerate "my videos", so listing goes through the channel instead:
//!
//! 1. [`channels::Channel`] (`mine=true`) names the channel's uploads playlist
//! 2. [`playlist_items::PlaylistItem`]s of that playlist carry video ids
//! 3. `videos.list` with those ids returns the [`videos::Video`] resources, including status

pub mod channels;
pub mod client;
pub mod playlist_items;
pub mod types;
pub mod videos;

pub use client::YouTubeClient;
pub use types::PageInfo;

pub use videos::{Video, VideoSnippet, VideoStatus, VideoStatusUpdate, VideoUpload};

pub use channels::{Channel, ChannelSnippet};
