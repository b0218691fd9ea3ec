use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::api::{RedditApiClient, RedditPostData};
use crate::auth::RedditAuthenticator;
use prospector_core::{AppConfig, CoreError, RedditPost};

/// Candidates examined per requested post, to absorb already-seen skips.
pub const CANDIDATE_MULTIPLIER: usize = 5;

/// Largest page Reddit will return per listing request.
const MAX_PAGE_SIZE: usize = 100;

static POST_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"comments/([a-z0-9]+)").expect("static regex"));

/// Extracts the post id from a pasted Reddit URL, e.g.
/// `https://reddit.com/r/rust/comments/abc123/some_title/` -> `abc123`.
pub fn post_id_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    POST_ID_RE
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read-only fetcher over the Reddit listing API. Never returns a post whose
/// id is in the caller-supplied seen set.
pub struct ContentFetcher {
    api: RedditApiClient,
    auth: RedditAuthenticator,
}

impl ContentFetcher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: RedditApiClient::new(config.reddit_user_agent.clone()),
            auth: RedditAuthenticator::new(
                config.reddit_client_id.clone(),
                config.reddit_client_secret.clone(),
            ),
        }
    }

    /// At most `max_posts` unseen posts from the subreddit's newest listing,
    /// each with up to `max_comments` top-level comment bodies. Examines at
    /// most `CANDIDATE_MULTIPLIER * max_posts` candidates.
    pub async fn fetch_new(
        &self,
        subreddit: &str,
        max_posts: usize,
        max_comments: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<RedditPost>, CoreError> {
        if max_posts == 0 {
            return Ok(Vec::new());
        }

        let token = self.auth.access_token().await?;
        let budget = max_posts * CANDIDATE_MULTIPLIER;

        let mut posts = Vec::new();
        let mut examined = 0usize;
        let mut after: Option<String> = None;

        'pages: while posts.len() < max_posts && examined < budget {
            let page_size = (budget - examined).min(MAX_PAGE_SIZE);
            let listing = self
                .api
                .get_new_posts(&token, subreddit, page_size as u32, after.as_deref())
                .await?;

            if listing.data.children.is_empty() {
                break;
            }

            for child in &listing.data.children {
                examined += 1;
                let data = &child.data;

                if seen.contains(&data.id) {
                    debug!("Skipping already-seen post {}", data.id);
                } else {
                    let comments = if max_comments > 0 {
                        self.api
                            .get_post_comments(&token, subreddit, &data.id, max_comments)
                            .await?
                    } else {
                        Vec::new()
                    };
                    posts.push(to_post(data.clone(), comments));
                }

                if posts.len() >= max_posts || examined >= budget {
                    break 'pages;
                }
            }

            after = listing.data.after.clone();
            if after.is_none() {
                break;
            }
        }

        info!(
            "Fetched {} new posts from r/{} ({} candidates examined)",
            posts.len(),
            subreddit,
            examined
        );
        Ok(posts)
    }

    /// Single post with comments, used by the analyze-URL path.
    pub async fn fetch_by_id(
        &self,
        post_id: &str,
        max_comments: usize,
    ) -> Result<RedditPost, CoreError> {
        let token = self.auth.access_token().await?;
        let data = self.api.get_post_by_id(&token, post_id).await?;

        let comments = if max_comments > 0 {
            self.api
                .get_post_comments(&token, &data.subreddit.clone(), post_id, max_comments)
                .await?
        } else {
            Vec::new()
        };

        Ok(to_post(data, comments))
    }
}

fn to_post(data: RedditPostData, comments: Vec<String>) -> RedditPost {
    RedditPost {
        url: format!("https://reddit.com{}", data.permalink),
        id: data.id,
        subreddit: data.subreddit,
        title: data.title,
        body: data.selftext,
        comments,
    }
}
