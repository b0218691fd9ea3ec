use std::fmt;

use thiserror::Error;

/// The pipeline stage an LLM failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Judgment,
    Solution,
    Playbook,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Judgment => write!(f, "judgment"),
            Stage::Solution => write!(f, "solution"),
            Stage::Playbook => write!(f, "playbook"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Quota error: {0}")]
    Quota(#[from] QuotaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    #[error("Corrupt row: {details}")]
    CorruptRow { details: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("API key invalid or rejected")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Service unavailable: {status_code}")]
    ServiceUnavailable { status_code: u16 },

    #[error("Request rejected with status {status_code}")]
    RequestRejected { status_code: u16 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("{stage} stage returned an empty response")]
    EmptyResponse { stage: Stage },

    #[error("{stage} stage returned malformed JSON: {details}")]
    MalformedResponse { stage: Stage, details: String },
}

impl LlmError {
    /// The pipeline stage this error occurred in, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            LlmError::EmptyResponse { stage } | LlmError::MalformedResponse { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid verification token")]
    Invalid,

    #[error("Verification token expired")]
    Expired,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaError {
    #[error("Daily quota exceeded: {used}/{limit} scrapes used today")]
    Exceeded { used: i64, limit: i64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
