use crate::models::{
    ClassificationResult, ClassifiedEmail, NewClassifiedEmail, ServiceError,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;

#[async_trait]
pub trait ClassificationRepository: Send + Sync {
    async fn upsert_classification(
        &self,
        user_id: i64,
        email_id: &str,
        result: &ClassificationResult,
    ) -> Result<(), ServiceError>;
    async fn upsert_classified_email(&self, email: &NewClassifiedEmail) -> Result<(), ServiceError>;
    async fn find_recent_classified(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ClassifiedEmail>, ServiceError>;
}

pub struct SqliteClassificationRepository {
    pool: SqlitePool,
}

impl SqliteClassificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassificationRepository for SqliteClassificationRepository {
    async fn upsert_classification(
        &self,
        user_id: i64,
        email_id: &str,
        result: &ClassificationResult,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO email_classifications (email_id, user_id, category, confidence, reason, classified_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (email_id, user_id) DO UPDATE SET
                category = excluded.category,
                confidence = excluded.confidence,
                reason = excluded.reason,
                classified_at = excluded.classified_at",
        )
        .bind(email_id)
        .bind(user_id)
        .bind(result.classification.as_str())
        .bind(result.confidence)
        .bind(&result.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_classified_email(&self, email: &NewClassifiedEmail) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO classified_emails (gmail_id, user_id, thread_id, subject, snippet, sender, received_at, is_read, label_ids, content, classification_type, classification_reason, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (gmail_id, user_id) DO UPDATE SET
                classification_type = excluded.classification_type,
                classification_reason = excluded.classification_reason,
                updated_at = excluded.updated_at",
        )
        .bind(&email.gmail_id)
        .bind(email.user_id)
        .bind(&email.thread_id)
        .bind(&email.subject)
        .bind(&email.snippet)
        .bind(&email.sender)
        .bind(email.received_at)
        .bind(email.is_read)
        .bind(Json(&email.label_ids))
        .bind(&email.content)
        .bind(&email.classification_type)
        .bind(&email.classification_reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_recent_classified(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ClassifiedEmail>, ServiceError> {
        let emails = sqlx::query_as::<_, ClassifiedEmail>(
            "SELECT id, gmail_id, user_id, thread_id, subject, snippet, sender, received_at, is_read, label_ids, content, classification_type, classification_reason, updated_at
             FROM classified_emails WHERE user_id = ? ORDER BY received_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }
}
