//! OAuth 2.0 token handling for YouTube API access.
//!
//! Accounts are configured with long-lived refresh tokens (obtained out of band). This module
//! exchanges those for short-lived access tokens and keeps track of when they run out.

use crate::config::{ClientCredentials, RefreshSecret};
use eyre::Context;
use oauth2::basic::{BasicClient, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AccessToken, ClientId, ClientSecret, EmptyExtraTokenFields, RefreshToken,
    StandardTokenResponse, TokenResponse, TokenUrl, reqwest,
};
use std::time::{Duration, SystemTime};

/// Google OAuth2 token endpoint used for the refresh-token exchange.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Exchanges refresh tokens for access tokens on behalf of one OAuth client.
#[derive(Debug, Clone)]
pub(crate) struct OAuthManager {
    credentials: ClientCredentials,
    http_client: reqwest::Client,
}

impl OAuthManager {
    pub(crate) fn new(credentials: ClientCredentials) -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - The grant was rejected or no refresh token was available
    /// * `Err(_)` - Network or other error occurred during the refresh attempt
    pub(crate) async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        let token_url = TokenUrl::new(TOKEN_URL.to_string()).context("parse token endpoint URL")?;
        let client = BasicClient::new(ClientId::new(self.credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.credentials.client_secret.clone()))
            .set_token_uri(token_url);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&self.http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }
}

/// An OAuth token together with the instant its access token should be treated as expired.
#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Wraps a configured refresh token in a token whose access part is already expired, so the
    /// first API call performs the exchange.
    pub fn from_refresh_secret(secret: &RefreshSecret) -> Self {
        let mut token = StandardTokenResponse::new(
            AccessToken::new(String::new()),
            BasicTokenType::Bearer,
            EmptyExtraTokenFields {},
        );
        token.set_refresh_token(Some(RefreshToken::new(secret.secret().to_string())));
        Self {
            token,
            expires_at: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    pub fn access_token(&self) -> &str {
        self.token.access_token().secret()
    }

    /// Refreshes this token, preserving the refresh token if the response omits it.
    ///
    /// Returns `Ok(false)` when the grant was rejected.
    pub(crate) async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(&self.token)
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google normally omits the refresh token on refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Current time + `expires_in` - 5 minute safety buffer; 55 minutes if `expires_in` is absent.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        match token.expires_in() {
            Some(expires_in) => now + expires_in.saturating_sub(Duration::from_secs(300)),
            None => now + Duration::from_secs(3300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_refresh_token_starts_expired() {
        let token = TimeBoundAccessToken::from_refresh_secret(&RefreshSecret::new("rt"));
        assert!(token.is_expired(SystemTime::now()));
        assert_eq!(token.access_token(), "");
        assert_eq!(
            token.token.refresh_token().map(|t| t.secret().as_str()),
            Some("rt")
        );
    }

    #[test]
    fn expiry_keeps_a_safety_buffer() {
        let mut token = StandardTokenResponse::new(
            AccessToken::new("at".to_string()),
            BasicTokenType::Bearer,
            EmptyExtraTokenFields {},
        );
        token.set_expires_in(Some(&Duration::from_secs(3600)));

        let before = SystemTime::now();
        let expiry = TimeBoundAccessToken::calculate_token_expiry(&token);
        assert!(expiry >= before + Duration::from_secs(3300));
        assert!(expiry < before + Duration::from_secs(3600));

        // shorter than the buffer must not underflow
        token.set_expires_in(Some(&Duration::from_secs(60)));
        let expiry = TimeBoundAccessToken::calculate_token_expiry(&token);
        assert!(expiry >= before);
    }
}
