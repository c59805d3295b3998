//! Process configuration: platform credentials and upload defaults.
//!
//! Everything is read once at startup into a [`Config`], which is then handed to the
//! constructors that need it. Nothing in the crate reads the environment after that.

use crate::error::UploadError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// The account slots that may carry a `YOUTUBE_REFRESH_TOKEN_<slot>` variable.
pub const ACCOUNT_SLOTS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

pub const DEFAULT_TITLE: &str = "Short Form Video";
pub const DEFAULT_DESCRIPTION: &str = "Check out this amazing short-form video!";
pub const DEFAULT_TAGS: &str = "shorts,video,content";
/// YouTube's "People & Blogs" category.
pub const DEFAULT_CATEGORY_ID: &str = "22";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPLOAD_INTERVAL: Duration = Duration::from_secs(2);

/// A named credential slot, e.g. `A`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slot = s.trim().to_ascii_uppercase();
        if ACCOUNT_SLOTS.contains(&slot.as_str()) {
            Ok(Self(slot))
        } else {
            Err(UploadError::UnknownAccount(s.to_string()))
        }
    }
}

/// OAuth client credentials shared by every account.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A refresh token for one account slot.
#[derive(Clone)]
pub struct RefreshSecret(String);

impl RefreshSecret {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshSecret(<redacted>)")
    }
}

/// YouTube credentials: one client, one or more accounts.
#[derive(Debug, Clone)]
pub struct YouTubeCredentials {
    pub client: ClientCredentials,
    /// Configured accounts in slot order.
    pub accounts: BTreeMap<AccountId, RefreshSecret>,
}

impl YouTubeCredentials {
    /// The account used when a call does not name one: the first configured slot.
    pub fn default_account(&self) -> Option<&AccountId> {
        self.accounts.keys().next()
    }

    pub fn account_ids(&self) -> Vec<AccountId> {
        self.accounts.keys().cloned().collect()
    }
}

/// Metadata used when an upload leaves a field unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDefaults {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
}

impl Default for VideoDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            tags: split_tags(DEFAULT_TAGS),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
        }
    }
}

/// Everything the binaries need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Holds the list of missing variables when credentials are incomplete.
    youtube: Result<YouTubeCredentials, String>,
    pub defaults: VideoDefaults,
    pub videos_dir: PathBuf,
    pub port: u16,
    /// Pause between successive uploads in a batch.
    pub upload_interval: Duration,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("could not load .env file: {e}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. Missing credentials do not fail construction; they
    /// surface through [`Config::youtube`] so that the web server can still start and report
    /// its degraded state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let youtube = load_youtube_credentials(&get);

        let defaults = VideoDefaults {
            title: get("DEFAULT_VIDEO_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: get("DEFAULT_VIDEO_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            tags: split_tags(&get("DEFAULT_VIDEO_TAGS").unwrap_or_else(|| DEFAULT_TAGS.to_string())),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
        };

        let port = match get("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!("ignoring invalid PORT ({e}), using {DEFAULT_PORT}");
                DEFAULT_PORT
            }
            None => DEFAULT_PORT,
        };

        let upload_interval = match get("UPLOAD_INTERVAL_MS").map(|ms| ms.parse::<u64>()) {
            Some(Ok(ms)) => Duration::from_millis(ms),
            Some(Err(e)) => {
                tracing::warn!("ignoring invalid UPLOAD_INTERVAL_MS ({e})");
                DEFAULT_UPLOAD_INTERVAL
            }
            None => DEFAULT_UPLOAD_INTERVAL,
        };

        Self {
            youtube,
            defaults,
            videos_dir: get("VIDEOS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("videos")),
            port,
            upload_interval,
        }
    }

    /// The YouTube credentials, or a [`UploadError::Configuration`] naming what is missing.
    pub fn youtube(&self) -> Result<&YouTubeCredentials, UploadError> {
        self.youtube
            .as_ref()
            .map_err(|missing| UploadError::Configuration(missing.clone()))
    }

    /// Account ids with a configured refresh token, in slot order.
    pub fn youtube_accounts(&self) -> Vec<AccountId> {
        self.youtube
            .as_ref()
            .map(YouTubeCredentials::account_ids)
            .unwrap_or_default()
    }
}

fn load_youtube_credentials(
    get: &impl Fn(&str) -> Option<String>,
) -> Result<YouTubeCredentials, String> {
    let mut missing = Vec::new();
    let client_id = get("YOUTUBE_CLIENT_ID");
    if client_id.is_none() {
        missing.push("YOUTUBE_CLIENT_ID".to_string());
    }
    let client_secret = get("YOUTUBE_CLIENT_SECRET");
    if client_secret.is_none() {
        missing.push("YOUTUBE_CLIENT_SECRET".to_string());
    }

    let accounts: BTreeMap<_, _> = ACCOUNT_SLOTS
        .iter()
        .filter_map(|slot| {
            get(&format!("YOUTUBE_REFRESH_TOKEN_{slot}"))
                .map(|token| (AccountId(slot.to_string()), RefreshSecret::new(token)))
        })
        .collect();
    if accounts.is_empty() {
        missing.push("YOUTUBE_REFRESH_TOKEN_A (or B, C, D, E, F)".to_string());
    }

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) if missing.is_empty() => Ok(YouTubeCredentials {
            client: ClientCredentials {
                client_id,
                client_secret,
            },
            accounts,
        }),
        _ => Err(format!(
            "missing required environment variables: {}",
            missing.join(", ")
        )),
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn loads_credentials_and_accounts_in_slot_order() {
        let config = Config::from_lookup(lookup(&[
            ("YOUTUBE_CLIENT_ID", "id"),
            ("YOUTUBE_CLIENT_SECRET", "secret"),
            ("YOUTUBE_REFRESH_TOKEN_C", "token-c"),
            ("YOUTUBE_REFRESH_TOKEN_B", "token-b"),
        ]));

        let youtube = config.youtube().unwrap();
        assert_eq!(youtube.client.client_id, "id");
        assert_eq!(youtube.default_account().map(AccountId::as_str), Some("B"));
        let ids: Vec<_> = config.youtube_accounts().iter().map(|a| a.to_string()).collect();
        assert_eq!(ids, ["B", "C"]);
        assert_eq!(youtube.accounts[&"C".parse::<AccountId>().unwrap()].secret(), "token-c");
    }

    #[test]
    fn missing_credentials_are_reported_not_fatal() {
        let config = Config::from_lookup(lookup(&[("YOUTUBE_CLIENT_ID", "id")]));
        let err = config.youtube().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, UploadError::Configuration(_)));
        assert!(msg.contains("YOUTUBE_CLIENT_SECRET"), "{msg}");
        assert!(msg.contains("YOUTUBE_REFRESH_TOKEN_A"), "{msg}");
        assert!(config.youtube_accounts().is_empty());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("YOUTUBE_CLIENT_ID", "id"),
            ("YOUTUBE_CLIENT_SECRET", "secret"),
            ("YOUTUBE_REFRESH_TOKEN_A", "  "),
        ]));
        assert!(config.youtube().is_err());
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.defaults, VideoDefaults::default());
        assert_eq!(config.defaults.tags, ["shorts", "video", "content"]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upload_interval, DEFAULT_UPLOAD_INTERVAL);
        assert_eq!(config.videos_dir, PathBuf::from("videos"));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("DEFAULT_VIDEO_TITLE", "Title"),
            ("DEFAULT_VIDEO_TAGS", "a, b,,c"),
            ("PORT", "8080"),
            ("UPLOAD_INTERVAL_MS", "250"),
            ("VIDEOS_DIR", "/srv/videos"),
        ]));
        assert_eq!(config.defaults.title, "Title");
        assert_eq!(config.defaults.tags, ["a", "b", "c"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_interval, Duration::from_millis(250));
        assert_eq!(config.videos_dir, PathBuf::from("/srv/videos"));
    }

    #[test]
    fn account_ids_parse_case_insensitively() {
        assert_eq!("b".parse::<AccountId>().unwrap().as_str(), "B");
        assert!(matches!(
            "Z".parse::<AccountId>(),
            Err(UploadError::UnknownAccount(_))
        ));
    }
}
