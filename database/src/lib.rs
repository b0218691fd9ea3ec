use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use prospector_core::{CoreError, DatabaseError};

mod results;
mod usage;
mod verification;


pub use verification::{verification_ttl, VERIFICATION_TTL_MINUTES};

const SCHEMA: &[(&str, &str)] = &[
    (
        "scraped_posts",
        "CREATE TABLE IF NOT EXISTS scraped_posts (
            post_id TEXT PRIMARY KEY,
            scraped_at TEXT NOT NULL
        )",
    ),
    (
        "scraped_results",
        "CREATE TABLE IF NOT EXISTS scraped_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            scraped_at TEXT NOT NULL,
            subreddit TEXT NOT NULL,
            reddit_url TEXT NOT NULL,
            reddit_title TEXT NOT NULL,
            reddit_id TEXT NOT NULL,
            analysis TEXT NOT NULL,
            solution TEXT NOT NULL,
            cursor_playbook TEXT NOT NULL,
            user_id TEXT NOT NULL
        )",
    ),
    (
        "pending_verifications",
        "CREATE TABLE IF NOT EXISTS pending_verifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            token TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
    ),
    (
        "verified_users",
        "CREATE TABLE IF NOT EXISTS verified_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            verified_at TEXT NOT NULL,
            last_login TEXT NOT NULL
        )",
    ),
    (
        "daily_usage",
        "CREATE TABLE IF NOT EXISTS daily_usage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            date TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            UNIQUE(email, date)
        )",
    ),
    (
        "idx_daily_usage_email_date",
        "CREATE INDEX IF NOT EXISTS idx_daily_usage_email_date
            ON daily_usage(email, date)",
    ),
    (
        "subscriptions",
        "CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            customer_id TEXT,
            plan TEXT NOT NULL,
            status TEXT NOT NULL,
            current_period_end TEXT
        )",
    ),
    (
        "upgrade_interests",
        "CREATE TABLE IF NOT EXISTS upgrade_interests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            path TEXT NOT NULL,
            user_agent TEXT,
            created_at TEXT NOT NULL
        )",
    ),
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the SQLite file and returns a pooled handle.
    pub async fn connect(path: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to database at {}", path);
        Ok(Self { pool })
    }

    /// Creates every table; safe to run on every startup.
    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        for (name, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationFailed {
                    migration: format!("{}: {}", name, e),
                })?;
        }
        debug!("Migrations complete ({} statements)", SCHEMA.len());
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All post ids ever recorded as processed.
    pub async fn seen_post_ids(&self) -> Result<HashSet<String>, CoreError> {
        let rows = sqlx::query("SELECT post_id FROM scraped_posts")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("post_id"))
            .collect())
    }

    /// Idempotent: marking the same post twice leaves a single ledger row.
    pub async fn mark_post_scraped(&self, post_id: &str) -> Result<(), CoreError> {
        sqlx::query("INSERT OR IGNORE INTO scraped_posts (post_id, scraped_at) VALUES (?1, ?2)")
            .bind(post_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;
        debug!("Ledgered post {}", post_id);
        Ok(())
    }

    pub async fn is_post_scraped(&self, post_id: &str) -> Result<bool, CoreError> {
        let row = sqlx::query("SELECT 1 FROM scraped_posts WHERE post_id = ?1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;
        Ok(row.is_some())
    }
}
