use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use prospector_core::{CoreError, DatabaseError, VerificationError};

use crate::Database;

/// Tokens are consumable for ten minutes after issuance.
pub const VERIFICATION_TTL_MINUTES: i64 = 10;

pub fn verification_ttl() -> Duration {
    Duration::minutes(VERIFICATION_TTL_MINUTES)
}

impl Database {
    /// Issues a fresh opaque token for the email, expiring after
    /// [`VERIFICATION_TTL_MINUTES`].
    pub async fn create_verification(&self, email: &str) -> Result<String, CoreError> {
        self.create_verification_with_ttl(email, verification_ttl())
            .await
    }

    pub async fn create_verification_with_ttl(
        &self,
        email: &str,
        ttl: Duration,
    ) -> Result<String, CoreError> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO pending_verifications (email, token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(email)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind((now + ttl).to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(DatabaseError::Sql)?;

        info!("Issued verification token for {}", email);
        Ok(token)
    }

    /// Consumes a token: `Invalid` when unknown (or already consumed),
    /// `Expired` when past its expiry. On success the verified-users row is
    /// upserted, the pending row removed, and the email returned.
    pub async fn consume_token(&self, token: &str) -> Result<String, CoreError> {
        let mut tx = self.pool().begin().await.map_err(DatabaseError::Sql)?;

        let row = sqlx::query(
            "SELECT email, expires_at FROM pending_verifications WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::Sql)?;

        let Some(row) = row else {
            return Err(VerificationError::Invalid.into());
        };

        let email: String = row.get("email");
        let expires_raw: String = row.get("expires_at");
        let expires_at = DateTime::parse_from_rfc3339(&expires_raw)
            .map_err(|e| DatabaseError::CorruptRow {
                details: format!("expires_at '{}': {}", expires_raw, e),
            })?
            .with_timezone(&Utc);

        if Utc::now() > expires_at {
            // Expired tokens are swept on touch.
            sqlx::query("DELETE FROM pending_verifications WHERE token = ?1")
                .bind(token)
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::Sql)?;
            tx.commit().await.map_err(DatabaseError::Sql)?;
            debug!("Rejected expired verification token for {}", email);
            return Err(VerificationError::Expired.into());
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO verified_users (email, verified_at, last_login)
             VALUES (?1, ?2, ?2)
             ON CONFLICT(email) DO UPDATE SET last_login = excluded.last_login",
        )
        .bind(&email)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::Sql)?;

        sqlx::query("DELETE FROM pending_verifications WHERE token = ?1")
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Sql)?;

        tx.commit().await.map_err(DatabaseError::Sql)?;
        info!("Verified email {}", email);
        Ok(email)
    }

    pub async fn is_verified(&self, email: &str) -> Result<bool, CoreError> {
        let row = sqlx::query("SELECT 1 FROM verified_users WHERE email = ?1")
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(DatabaseError::Sql)?;
        Ok(row.is_some())
    }

    /// Refreshes `last_login` for an already-verified user; a no-op for
    /// unknown emails.
    pub async fn touch_last_login(&self, email: &str) -> Result<(), CoreError> {
        sqlx::query("UPDATE verified_users SET last_login = ?1 WHERE email = ?2")
            .bind(Utc::now().to_rfc3339())
            .bind(email)
            .execute(self.pool())
            .await
            .map_err(DatabaseError::Sql)?;
        Ok(())
    }
}
