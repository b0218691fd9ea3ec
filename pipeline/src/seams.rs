use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use database::Database;
use prospector_core::{CoreError, RedditPost, ResultRecord};
use reddit_client::ContentFetcher;

/// Where posts come from. Production: the Reddit fetcher.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_new(
        &self,
        subreddit: &str,
        max_posts: usize,
        max_comments: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<RedditPost>, CoreError>;
}

#[async_trait]
impl PostSource for ContentFetcher {
    async fn fetch_new(
        &self,
        subreddit: &str,
        max_posts: usize,
        max_comments: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<RedditPost>, CoreError> {
        ContentFetcher::fetch_new(self, subreddit, max_posts, max_comments, seen).await
    }
}

/// Durable set of post ids already turned into records.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn seen_post_ids(&self) -> Result<HashSet<String>, CoreError>;
    async fn mark_scraped(&self, post_id: &str) -> Result<(), CoreError>;
}

pub struct DbLedger {
    db: Arc<Database>,
}

impl DbLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Ledger for DbLedger {
    async fn seen_post_ids(&self) -> Result<HashSet<String>, CoreError> {
        self.db.seen_post_ids().await
    }

    async fn mark_scraped(&self, post_id: &str) -> Result<(), CoreError> {
        self.db.mark_post_scraped(post_id).await
    }
}

/// Where finished records go.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: &ResultRecord) -> Result<(), CoreError>;
}

/// One JSON object per line, appended to a file. The CLI's sink.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonlSink {
    async fn append(&self, record: &ResultRecord) -> Result<(), CoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended record {} to {}", record.meta.uuid, self.path.display());
        Ok(())
    }
}

/// Row insert keyed by the owning user. The web front end's sink.
pub struct DbSink {
    db: Arc<Database>,
    owner: String,
}

impl DbSink {
    pub fn new(db: Arc<Database>, owner: String) -> Self {
        Self { db, owner }
    }
}

#[async_trait]
impl ResultSink for DbSink {
    async fn append(&self, record: &ResultRecord) -> Result<(), CoreError> {
        self.db.insert_result(record, &self.owner).await
    }
}
