use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use prospector_core::{CoreError, RedditApiError};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    pub permalink: String,
    pub url: String,
    pub created_utc: f64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Self {
        let rate_limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            rate_limiter,
            user_agent,
        }
    }

    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        self.rate_limiter.until_ready().await;
        debug!("Rate limit cleared for {} {}", method, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status {} for {}", status, endpoint);
        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited by Reddit, retry after {} seconds", retry_after);
                Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded {
                    retry_after,
                }))
            }
            401 => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            403 => Err(CoreError::RedditApi(RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            })),
            404 => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            })),
            code if status.is_server_error() => {
                Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: code,
                }))
            }
            _ => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", status, endpoint),
            })),
        }
    }

    /// Most-recent listing for a subreddit.
    pub async fn get_new_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let limit_str = limit.to_string();
        let mut params = vec![("limit", limit_str.as_str())];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Top-level comment bodies for one post, bounded by `limit`.
    pub async fn get_post_comments(
        &self,
        access_token: &str,
        subreddit: &str,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, CoreError> {
        let endpoint = format!("/r/{}/comments/{}", subreddit, post_id);
        let limit_str = limit.to_string();
        let params = [("limit", limit_str.as_str()), ("depth", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        // The comments endpoint returns [post listing, comment listing].
        let listings: Vec<RedditListing<serde_json::Value>> =
            response.json().await.map_err(|e| {
                error!("Failed to parse comments: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Failed to parse comments for post {}", post_id),
                })
            })?;

        let mut bodies = Vec::new();
        if let Some(comment_listing) = listings.get(1) {
            for child in &comment_listing.data.children {
                if child.kind != "t1" {
                    continue;
                }
                if let Some(body) = child.data.get("body").and_then(|b| b.as_str()) {
                    bodies.push(body.to_string());
                    if bodies.len() >= limit {
                        break;
                    }
                }
            }
        }

        debug!("Retrieved {} comments for post {}", bodies.len(), post_id);
        Ok(bodies)
    }

    /// Single post lookup via the fullname info endpoint.
    pub async fn get_post_by_id(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<RedditPostData, CoreError> {
        let fullname = format!("t3_{}", post_id);
        let params = [("id", fullname.as_str())];

        let response = self
            .make_request(Method::GET, "/api/info", access_token, Some(&params))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse post info: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse info for post {}", post_id),
            })
        })?;

        listing
            .data
            .children
            .into_iter()
            .next()
            .map(|child| child.data)
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::PostNotFound {
                    post_id: post_id.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_client_creation() {
        let client = RedditApiClient::new("test-user-agent/1.0".to_string());
        assert_eq!(client.user_agent, "test-user-agent/1.0");
        assert!(client.rate_limiter.available_tokens().await > 0.0);
    }

    #[test]
    fn test_listing_deserialization() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "abc123",
                            "title": "Test Post",
                            "selftext": "body text",
                            "subreddit": "test",
                            "permalink": "/r/test/comments/abc123/test_post/",
                            "url": "https://reddit.com/r/test/comments/abc123/test_post/",
                            "created_utc": 1640995200.0,
                            "num_comments": 5,
                            "stickied": false,
                            "is_self": true
                        }
                    }
                ],
                "after": null,
                "before": null,
                "dist": 1
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.id, "abc123");
        assert!(listing.data.children[0].data.is_self);
    }

    #[test]
    fn test_post_data_tolerates_missing_optionals() {
        let raw = r#"{
            "id": "xyz",
            "title": "Link post",
            "subreddit": "test",
            "permalink": "/r/test/comments/xyz/link_post/",
            "url": "https://example.com",
            "created_utc": 1.0
        }"#;
        let data: RedditPostData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.selftext, "");
        assert!(!data.stickied);
    }
}
