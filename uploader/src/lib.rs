//! Upload local video files to social-media platforms.
//!
//! The library is layered leaf-first: [`files`] locates candidate videos, [`youtube_api`] speaks
//! the YouTube Data API, [`uploader`] turns that into upload semantics, and [`orchestrator`] runs
//! a batch across platforms. The `multi-uploader` CLI and the `multi-uploader-web` server (see
//! [`web`]) are thin layers over the orchestrator.

pub mod config;
pub mod error;
pub mod files;
pub(crate) mod oauth;
pub mod orchestrator;
pub mod platform;
pub mod schedule;
pub mod uploader;
pub mod web;
pub mod youtube_api;

pub use config::{AccountId, Config};
pub use error::UploadError;
pub use orchestrator::{BatchReport, BatchRequest, Orchestrator};
pub use platform::{Outcome, PlatformId, UploadOptions, UploadResult, Visibility};
pub use uploader::YouTubeUploader;

use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber shared by both binaries.
///
/// Logs go to stderr so that command output on stdout stays clean. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
