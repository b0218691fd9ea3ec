use std::time::{Duration, Instant};

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use tokio::sync::Mutex;
use tracing::{debug, info};

use prospector_core::{CoreError, RedditApiError};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Application-only (client credentials) Reddit authentication with an
/// expiry-aware token cache.
pub struct RedditAuthenticator {
    oauth: BasicClient,
    cached: Mutex<Option<CachedToken>>,
}

impl RedditAuthenticator {
    pub fn new(client_id: String, client_secret: String) -> Self {
        let oauth = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            AuthUrl::new(REDDIT_AUTH_URL.to_string()).expect("static auth URL"),
            Some(TokenUrl::new(REDDIT_TOKEN_URL.to_string()).expect("static token URL")),
        );

        Self {
            oauth,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, exchanging client credentials only when
    /// the cached token is missing or about to expire.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                debug!("Reusing cached Reddit access token");
                return Ok(token.access_token.clone());
            }
        }

        info!("Requesting new Reddit access token");
        let response = self
            .oauth
            .exchange_client_credentials()
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        let ttl = response.expires_in().unwrap_or(Duration::from_secs(3600));
        let token = CachedToken {
            access_token: response.access_token().secret().clone(),
            expires_at: Instant::now() + ttl,
        };
        let access_token = token.access_token.clone();
        *cached = Some(token);

        debug!("Cached Reddit access token for {:?}", ttl);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_starts_empty() {
        let auth = RedditAuthenticator::new("id".to_string(), "secret".to_string());
        assert!(auth.cached.lock().await.is_none());
    }

    #[tokio::test]
    async fn cached_token_is_reused_until_margin() {
        let auth = RedditAuthenticator::new("id".to_string(), "secret".to_string());
        {
            let mut cached = auth.cached.lock().await;
            *cached = Some(CachedToken {
                access_token: "tok".to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            });
        }
        let token = auth.access_token().await.expect("cached token");
        assert_eq!(token, "tok");
    }
}
