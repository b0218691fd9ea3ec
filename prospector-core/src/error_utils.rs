use crate::error::*;

/// Presentation helpers shared by the web layer and the CLI.
pub trait ErrorExt {
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Verification(e) => e.user_friendly_message(),
            CoreError::Quota(e) => e.user_friendly_message(),
            CoreError::Database(_) => {
                "A storage error occurred. Please try again.".to_string()
            }
            CoreError::Config(e) => format!("Configuration problem: {}", e),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => {
                format!("Invalid input: {}", message)
            }
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Database(_) => "DATABASE".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Verification(_) => "VERIFICATION".to_string(),
            CoreError::Quota(_) => "QUOTA".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests to Reddit. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::PostNotFound { .. } => {
                "The requested post could not be found.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey => {
                "The LLM API key was rejected. Please update your credentials.".to_string()
            }
            LlmError::RateLimitExceeded { retry_after } => format!(
                "LLM rate limit exceeded. Please wait {} seconds.",
                retry_after
            ),
            LlmError::EmptyResponse { stage } => {
                format!("The {} stage returned nothing; the post was skipped.", stage)
            }
            LlmError::MalformedResponse { stage, .. } => {
                format!("The {} stage returned an unreadable answer; the post was skipped.", stage)
            }
            _ => "The LLM service is unavailable. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidApiKey => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestRejected { .. } => "LLM_REQUEST_REJECTED".to_string(),
            LlmError::RequestTimeout => "LLM_TIMEOUT".to_string(),
            LlmError::EmptyResponse { .. } => "LLM_EMPTY_RESPONSE".to_string(),
            LlmError::MalformedResponse { .. } => "LLM_MALFORMED_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for VerificationError {
    fn user_friendly_message(&self) -> String {
        match self {
            VerificationError::Invalid => {
                "That verification link is not valid. Please request a new one.".to_string()
            }
            VerificationError::Expired => {
                "That verification link has expired. Please request a new one.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            VerificationError::Invalid => "TOKEN_INVALID".to_string(),
            VerificationError::Expired => "TOKEN_EXPIRED".to_string(),
        }
    }
}

impl ErrorExt for QuotaError {
    fn user_friendly_message(&self) -> String {
        match self {
            QuotaError::Exceeded { used, limit } => format!(
                "Daily quota exceeded: you have used {}/{} scrapes today. \
                 Verify your email to raise the limit, or come back tomorrow.",
                used, limit
            ),
        }
    }

    fn error_code(&self) -> String {
        "QUOTA_EXCEEDED".to_string()
    }
}
