use crate::models::{PreferenceUpdate, ServiceError, UserPreference};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const PREFERENCE_COLUMNS: &str = "id, user_id, custom_prompt, priority_senders, ignored_senders, content_keywords, processing_frequency, processing_schedule, last_processed_at, updated_at";

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<UserPreference>, ServiceError>;
    /// Replaces every editable field, creating the row when needed.
    async fn upsert(
        &self,
        user_id: i64,
        update: &PreferenceUpdate,
    ) -> Result<UserPreference, ServiceError>;
    async fn set_custom_prompt(&self, user_id: i64, prompt: &str) -> Result<(), ServiceError>;
    async fn mark_processed(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), ServiceError>;
}

pub struct SqlitePreferenceRepository {
    pool: SqlitePool,
}

impl SqlitePreferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn encode_list(list: &Option<Vec<String>>) -> Result<Option<String>, ServiceError> {
    Ok(list.as_ref().map(serde_json::to_string).transpose()?)
}

#[async_trait]
impl PreferenceRepository for SqlitePreferenceRepository {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<UserPreference>, ServiceError> {
        let preference = sqlx::query_as::<_, UserPreference>(&format!(
            "SELECT {} FROM user_preferences WHERE user_id = ?",
            PREFERENCE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preference)
    }

    async fn upsert(
        &self,
        user_id: i64,
        update: &PreferenceUpdate,
    ) -> Result<UserPreference, ServiceError> {
        let schedule = update
            .processing_schedule
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO user_preferences (user_id, custom_prompt, priority_senders, ignored_senders, content_keywords, processing_frequency, processing_schedule, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET
                custom_prompt = excluded.custom_prompt,
                priority_senders = excluded.priority_senders,
                ignored_senders = excluded.ignored_senders,
                content_keywords = excluded.content_keywords,
                processing_frequency = excluded.processing_frequency,
                processing_schedule = excluded.processing_schedule,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(&update.custom_prompt)
        .bind(encode_list(&update.priority_senders)?)
        .bind(encode_list(&update.ignored_senders)?)
        .bind(encode_list(&update.content_keywords)?)
        .bind(update.processing_frequency.as_str())
        .bind(schedule)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::DatabaseError("Preferences not found after save".to_string()))
    }

    async fn set_custom_prompt(&self, user_id: i64, prompt: &str) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO user_preferences (user_id, custom_prompt, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET custom_prompt = excluded.custom_prompt, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(prompt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_processed(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO user_preferences (user_id, last_processed_at, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET last_processed_at = excluded.last_processed_at",
        )
        .bind(user_id)
        .bind(at)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
