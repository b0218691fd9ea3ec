pub mod api;
pub mod auth;
pub mod fetcher;
pub mod rate_limiter;

pub use api::{RedditApiClient, RedditListing, RedditPostData};
pub use auth::RedditAuthenticator;
pub use fetcher::{post_id_from_url, ContentFetcher, CANDIDATE_MULTIPLIER};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
