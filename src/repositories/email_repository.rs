use crate::models::{Email, NewEmail, ServiceError};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::SqlitePool;

const EMAIL_COLUMNS: &str = "id, user_id, gmail_id, thread_id, subject, snippet, sender, received_at, is_read, label_ids, category, category_confidence";

#[async_trait]
pub trait EmailRepository: Send + Sync {
    /// Inserts unless the message is already stored. Returns whether a row was added.
    async fn insert_if_absent(&self, email: &NewEmail) -> Result<bool, ServiceError>;
    /// Inserts or refreshes the Gmail-owned fields, keeping any category.
    async fn upsert(&self, email: &NewEmail) -> Result<(), ServiceError>;
    async fn find_by_gmail_id(
        &self,
        user_id: i64,
        gmail_id: &str,
    ) -> Result<Option<Email>, ServiceError>;
    /// Newest first
    async fn find_recent(
        &self,
        user_id: i64,
        limit: i64,
        only_uncategorized: bool,
    ) -> Result<Vec<Email>, ServiceError>;
    async fn set_category(
        &self,
        user_id: i64,
        gmail_id: &str,
        category: &str,
        confidence: f64,
    ) -> Result<bool, ServiceError>;
}

pub struct SqliteEmailRepository {
    pool: SqlitePool,
}

impl SqliteEmailRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailRepository for SqliteEmailRepository {
    async fn insert_if_absent(&self, email: &NewEmail) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "INSERT INTO emails (user_id, gmail_id, thread_id, subject, snippet, sender, received_at, is_read, label_ids)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, gmail_id) DO NOTHING",
        )
        .bind(email.user_id)
        .bind(&email.gmail_id)
        .bind(&email.thread_id)
        .bind(&email.subject)
        .bind(&email.snippet)
        .bind(&email.sender)
        .bind(email.received_at)
        .bind(email.is_read)
        .bind(Json(&email.label_ids))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, email: &NewEmail) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO emails (user_id, gmail_id, thread_id, subject, snippet, sender, received_at, is_read, label_ids)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, gmail_id) DO UPDATE SET
                thread_id = excluded.thread_id,
                subject = excluded.subject,
                snippet = excluded.snippet,
                sender = excluded.sender,
                received_at = excluded.received_at,
                is_read = excluded.is_read,
                label_ids = excluded.label_ids",
        )
        .bind(email.user_id)
        .bind(&email.gmail_id)
        .bind(&email.thread_id)
        .bind(&email.subject)
        .bind(&email.snippet)
        .bind(&email.sender)
        .bind(email.received_at)
        .bind(email.is_read)
        .bind(Json(&email.label_ids))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_gmail_id(
        &self,
        user_id: i64,
        gmail_id: &str,
    ) -> Result<Option<Email>, ServiceError> {
        let email = sqlx::query_as::<_, Email>(&format!(
            "SELECT {} FROM emails WHERE user_id = ? AND gmail_id = ?",
            EMAIL_COLUMNS
        ))
        .bind(user_id)
        .bind(gmail_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(email)
    }

    async fn find_recent(
        &self,
        user_id: i64,
        limit: i64,
        only_uncategorized: bool,
    ) -> Result<Vec<Email>, ServiceError> {
        let filter = if only_uncategorized {
            " AND category IS NULL"
        } else {
            ""
        };

        let emails = sqlx::query_as::<_, Email>(&format!(
            "SELECT {} FROM emails WHERE user_id = ?{} ORDER BY received_at DESC LIMIT ?",
            EMAIL_COLUMNS, filter
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }

    async fn set_category(
        &self,
        user_id: i64,
        gmail_id: &str,
        category: &str,
        confidence: f64,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "UPDATE emails SET category = ?, category_confidence = ? WHERE user_id = ? AND gmail_id = ?",
        )
        .bind(category)
        .bind(confidence)
        .bind(user_id)
        .bind(gmail_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
