use sqlx::Row;
use tracing::debug;

use prospector_core::{CoreError, DatabaseError, RecordMeta, RedditRef, ResultRecord};

use crate::Database;

impl Database {
    /// Stores one analyzed opportunity as a row, with the nested documents
    /// serialized as JSON text columns.
    pub async fn insert_result(
        &self,
        record: &ResultRecord,
        owner: &str,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO scraped_results
                (uuid, scraped_at, subreddit, reddit_url, reddit_title, reddit_id,
                 analysis, solution, cursor_playbook, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(record.meta.uuid.to_string())
        .bind(record.meta.scraped_at.to_rfc3339())
        .bind(&record.reddit.subreddit)
        .bind(&record.reddit.url)
        .bind(&record.reddit.title)
        .bind(&record.reddit.id)
        .bind(serde_json::to_string(&record.analysis)?)
        .bind(serde_json::to_string(&record.solution)?)
        .bind(serde_json::to_string(&record.cursor_playbook)?)
        .bind(owner)
        .execute(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        debug!("Stored result {} for {}", record.meta.uuid, owner);
        Ok(())
    }

    /// Most recent records for one owner, newest first.
    pub async fn recent_results(
        &self,
        owner: &str,
        limit: i64,
    ) -> Result<Vec<ResultRecord>, CoreError> {
        let rows = sqlx::query(
            "SELECT uuid, scraped_at, subreddit, reddit_url, reddit_title, reddit_id,
                    analysis, solution, cursor_playbook
             FROM scraped_results
             WHERE user_id = ?1
             ORDER BY scraped_at DESC
             LIMIT ?2",
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        rows.into_iter().map(|row| row_to_record(&row)).collect()
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ResultRecord, CoreError> {
    let uuid_raw: String = row.get("uuid");
    let scraped_raw: String = row.get("scraped_at");

    let uuid = uuid_raw
        .parse()
        .map_err(|e| DatabaseError::CorruptRow {
            details: format!("uuid '{}': {}", uuid_raw, e),
        })?;
    let scraped_at = chrono::DateTime::parse_from_rfc3339(&scraped_raw)
        .map_err(|e| DatabaseError::CorruptRow {
            details: format!("scraped_at '{}': {}", scraped_raw, e),
        })?
        .with_timezone(&chrono::Utc);

    let analysis_raw: String = row.get("analysis");
    let solution_raw: String = row.get("solution");
    let playbook_raw: String = row.get("cursor_playbook");

    Ok(ResultRecord {
        meta: RecordMeta { uuid, scraped_at },
        reddit: RedditRef {
            subreddit: row.get("subreddit"),
            url: row.get("reddit_url"),
            title: row.get("reddit_title"),
            id: row.get("reddit_id"),
        },
        analysis: serde_json::from_str(&analysis_raw)?,
        solution: serde_json::from_str(&solution_raw)?,
        cursor_playbook: serde_json::from_str(&playbook_raw)?,
    })
}
