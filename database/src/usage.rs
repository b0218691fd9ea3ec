use chrono::NaiveDate;
use tracing::debug;

use prospector_core::{CoreError, DatabaseError};

use crate::Database;

impl Database {
    /// Adds one to the (email, date) counter and returns the new value. The
    /// upsert is resolved by the store, so concurrent increments for the same
    /// key never lose updates.
    pub async fn increment_daily_usage(
        &self,
        email: &str,
        date: NaiveDate,
    ) -> Result<i64, CoreError> {
        let count: i64 = sqlx::query_scalar(
            "INSERT INTO daily_usage (email, date, count) VALUES (?1, ?2, 1)
             ON CONFLICT(email, date) DO UPDATE SET count = count + 1
             RETURNING count",
        )
        .bind(email)
        .bind(date.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        debug!("Usage for {} on {} is now {}", email, date, count);
        Ok(count)
    }

    pub async fn daily_usage(&self, email: &str, date: NaiveDate) -> Result<i64, CoreError> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT count FROM daily_usage WHERE email = ?1 AND date = ?2",
        )
        .bind(email)
        .bind(date.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        Ok(count.unwrap_or(0))
    }

    /// Sum of daily counts since `month_start` inclusive. Dates are stored as
    /// ISO strings, so lexicographic comparison is chronological.
    pub async fn monthly_usage(
        &self,
        email: &str,
        month_start: NaiveDate,
    ) -> Result<i64, CoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(count), 0) FROM daily_usage
             WHERE email = ?1 AND date >= ?2",
        )
        .bind(email)
        .bind(month_start.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        Ok(total)
    }

    /// Plan name from the newest active subscription, defaulting to "free".
    pub async fn active_plan(&self, email: &str) -> Result<String, CoreError> {
        let plan: Option<String> = sqlx::query_scalar(
            "SELECT plan FROM subscriptions
             WHERE email = ?1 AND status = 'active'
             ORDER BY current_period_end DESC
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        Ok(plan.unwrap_or_else(|| "free".to_string()))
    }

    pub async fn record_upgrade_interest(
        &self,
        email: &str,
        path: &str,
        user_agent: Option<&str>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO upgrade_interests (email, path, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(email)
        .bind(path)
        .bind(user_agent)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;
        Ok(())
    }
}
