use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comments included when building LLM context, regardless of how many were
/// fetched for display.
pub const CONTEXT_COMMENT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct RedditPost {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub comments: Vec<String>,
}

impl RedditPost {
    /// Concatenated title, body, and top comments, truncated to `char_budget`
    /// characters for the LLM stages.
    pub fn context_text(&self, max_comments: usize, char_budget: usize) -> String {
        let mut context = format!("Title: {}\n\nBody: {}\n\n", self.title, self.body);
        if !self.comments.is_empty() {
            context.push_str("Top Comments:\n");
            for comment in self.comments.iter().take(max_comments) {
                context.push_str(comment);
                context.push('\n');
            }
        }
        truncate_chars(&context, char_budget)
    }
}

/// Viability verdict for one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub is_viable: bool,
    #[serde(default)]
    pub is_opportunity: Option<bool>,
    #[serde(default)]
    pub problem_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_description: Option<String>,
    #[serde(default)]
    pub target_market: String,
    #[serde(default)]
    pub confidence_score: f64,
}

impl Judgment {
    /// Clamps the confidence score into [0, 1]; model output is not trusted
    /// to respect the range it was asked for.
    pub fn normalized(mut self) -> Self {
        self.confidence_score = self.confidence_score.clamp(0.0, 1.0);
        self
    }
}

/// Proposed MVP for a viable judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    #[serde(default)]
    pub solution_description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub mvp_features: Vec<String>,
    #[serde(default)]
    pub est_development_time: String,
}

impl Solution {
    /// Enforces the at-most-3-features contract the prompt asks for.
    pub fn normalized(mut self) -> Self {
        self.mvp_features.truncate(3);
        self
    }
}

/// Ordered build prompts for a code-generation assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playbook {
    #[serde(default)]
    pub prompts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeta {
    pub uuid: Uuid,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditRef {
    pub subreddit: String,
    pub url: String,
    pub title: String,
    pub id: String,
}

/// One fully analyzed opportunity, append-only once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub meta: RecordMeta,
    pub reddit: RedditRef,
    pub analysis: Judgment,
    pub solution: Solution,
    pub cursor_playbook: Vec<String>,
}

impl ResultRecord {
    pub fn assemble(
        post: &RedditPost,
        analysis: Judgment,
        solution: Solution,
        playbook: Playbook,
    ) -> Self {
        Self {
            meta: RecordMeta {
                uuid: Uuid::new_v4(),
                scraped_at: Utc::now(),
            },
            reddit: RedditRef {
                subreddit: post.subreddit.clone(),
                url: post.url.clone(),
                title: post.title.clone(),
                id: post.id.clone(),
            },
            analysis,
            solution,
            cursor_playbook: playbook.prompts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Added,
    #[serde(rename = "Not viable")]
    NotViable,
    Error,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Added => write!(f, "Added"),
            ReportStatus::NotViable => write!(f, "Not viable"),
            ReportStatus::Error => write!(f, "Error"),
        }
    }
}

/// Per-post outcome surfaced to the user after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReport {
    pub title: String,
    pub url: String,
    pub status: ReportStatus,
    pub details: String,
}

/// Truncates on a char boundary; `&s[..n]` panics on multi-byte titles.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Short title excerpt for log lines.
pub fn excerpt(s: &str) -> String {
    truncate_chars(s, 70)
}
