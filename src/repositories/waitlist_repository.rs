use crate::models::{ServiceError, WaitlistEntry};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    /// Fails with `Conflict` when the address is already listed.
    async fn add(&self, email: &str) -> Result<WaitlistEntry, ServiceError>;
}

pub struct SqliteWaitlistRepository {
    pool: SqlitePool,
}

impl SqliteWaitlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistRepository for SqliteWaitlistRepository {
    async fn add(&self, email: &str) -> Result<WaitlistEntry, ServiceError> {
        let result = sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlist_entries (email, created_at) VALUES (?, ?) RETURNING id, email, created_at",
        )
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                ServiceError::Conflict("This email is already on the waitlist.".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
