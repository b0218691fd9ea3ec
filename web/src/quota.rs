use chrono::Utc;
use tracing::debug;

use database::Database;
use prospector_core::{AppConfig, CoreError};

/// Usage key for sessions with no verified email.
pub const ANONYMOUS_KEY: &str = "anonymous";

#[derive(Debug, Clone, Copy)]
pub struct QuotaStatus {
    pub used: i64,
    pub limit: i64,
    pub verified: bool,
}

impl QuotaStatus {
    pub fn allows_scrape(&self) -> bool {
        self.used < self.limit
    }

    pub fn remaining(&self) -> i64 {
        (self.limit - self.used).max(0)
    }
}

fn usage_key(email: Option<&str>) -> &str {
    email.unwrap_or(ANONYMOUS_KEY)
}

/// Today's usage against the caller's limit. Verified users get the higher
/// limit; unverified emails count like anonymous sessions.
pub async fn check(
    db: &Database,
    email: Option<&str>,
    config: &AppConfig,
) -> Result<QuotaStatus, CoreError> {
    let today = Utc::now().date_naive();
    let key = usage_key(email);
    let used = db.daily_usage(key, today).await?;

    let verified = match email {
        Some(email) => db.is_verified(email).await?,
        None => false,
    };
    let limit = if verified {
        config.verified_daily_limit
    } else {
        config.anonymous_daily_limit
    };

    debug!("Quota for {}: {}/{} (verified={})", key, used, limit, verified);
    Ok(QuotaStatus {
        used,
        limit,
        verified,
    })
}

/// Counts one scrape invocation against today's counter.
pub async fn record_scrape(db: &Database, email: Option<&str>) -> Result<(), CoreError> {
    let today = Utc::now().date_naive();
    db.increment_daily_usage(usage_key(email), today).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_core::config::FileConfig;

    async fn setup() -> (Database, AppConfig) {
        let path = std::env::temp_dir().join(format!("test_quota_{}.db", uuid::Uuid::new_v4()));
        let db = Database::connect(path.to_str().unwrap()).await.unwrap();
        db.run_migrations().await.unwrap();

        let config = AppConfig::resolve(FileConfig {
            reddit_client_id: Some("id".to_string()),
            reddit_client_secret: Some("secret".to_string()),
            openai_api_key: Some("sk".to_string()),
            ..FileConfig::default()
        })
        .unwrap();
        (db, config)
    }

    #[tokio::test]
    async fn anonymous_quota_is_the_low_limit() {
        let (db, config) = setup().await;

        let status = check(&db, None, &config).await.unwrap();
        assert_eq!(status.limit, config.anonymous_daily_limit);
        assert!(!status.verified);
        assert!(status.allows_scrape());

        for _ in 0..config.anonymous_daily_limit {
            record_scrape(&db, None).await.unwrap();
        }
        let status = check(&db, None, &config).await.unwrap();
        assert!(!status.allows_scrape());
        assert_eq!(status.remaining(), 0);
    }

    #[tokio::test]
    async fn verified_users_get_the_higher_limit() {
        let (db, config) = setup().await;

        let token = db.create_verification("v@b.com").await.unwrap();
        db.consume_token(&token).await.unwrap();

        let status = check(&db, Some("v@b.com"), &config).await.unwrap();
        assert!(status.verified);
        assert_eq!(status.limit, config.verified_daily_limit);
    }

    #[tokio::test]
    async fn unverified_email_counts_like_anonymous_limit() {
        let (db, config) = setup().await;

        let status = check(&db, Some("nobody@b.com"), &config).await.unwrap();
        assert!(!status.verified);
        assert_eq!(status.limit, config.anonymous_daily_limit);
    }

    #[tokio::test]
    async fn scrapes_count_against_the_callers_key() {
        let (db, config) = setup().await;

        record_scrape(&db, Some("v@b.com")).await.unwrap();
        record_scrape(&db, None).await.unwrap();

        let named = check(&db, Some("v@b.com"), &config).await.unwrap();
        let anonymous = check(&db, None, &config).await.unwrap();
        assert_eq!(named.used, 1);
        assert_eq!(anonymous.used, 1);
    }
}
