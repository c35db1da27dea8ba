use crate::models::{BatchOutcome, ProcessingStats, ServiceError, STATUS_COMPLETED, STATUS_PROCESSING};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Opens a batch in the processing state and returns its row id.
    async fn start_batch(&self, user_id: i64, batch_id: &str) -> Result<i64, ServiceError>;
    async fn finish_batch(
        &self,
        id: i64,
        outcome: &BatchOutcome,
        status: &str,
    ) -> Result<(), ServiceError>;
    async fn latest_completed(&self, user_id: i64) -> Result<Option<ProcessingStats>, ServiceError>;
}

pub struct SqliteStatsRepository {
    pool: SqlitePool,
}

impl SqliteStatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn start_batch(&self, user_id: i64, batch_id: &str) -> Result<i64, ServiceError> {
        let result = sqlx::query(
            "INSERT INTO processing_stats (user_id, batch_id, start_time, status) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(batch_id)
        .bind(Utc::now())
        .bind(STATUS_PROCESSING)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn finish_batch(
        &self,
        id: i64,
        outcome: &BatchOutcome,
        status: &str,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            "UPDATE processing_stats SET end_time = ?, emails_processed = ?, success_count = ?, error_count = ?, status = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(outcome.emails_processed)
        .bind(outcome.success_count)
        .bind(outcome.error_count)
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_completed(&self, user_id: i64) -> Result<Option<ProcessingStats>, ServiceError> {
        let stats = sqlx::query_as::<_, ProcessingStats>(
            "SELECT id, user_id, batch_id, start_time, end_time, emails_processed, success_count, error_count, status
             FROM processing_stats WHERE user_id = ? AND status = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(STATUS_COMPLETED)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }
}
