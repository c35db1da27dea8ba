use crate::models::{Label, NewLabel, ServiceError};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn insert_if_absent(&self, label: &NewLabel) -> Result<bool, ServiceError>;
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Label>, ServiceError>;
}

pub struct SqliteLabelRepository {
    pool: SqlitePool,
}

impl SqliteLabelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelRepository for SqliteLabelRepository {
    async fn insert_if_absent(&self, label: &NewLabel) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "INSERT INTO labels (user_id, gmail_label_id, name, color, is_default)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, gmail_label_id) DO NOTHING",
        )
        .bind(label.user_id)
        .bind(&label.gmail_label_id)
        .bind(&label.name)
        .bind(&label.color)
        .bind(label.is_default)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Label>, ServiceError> {
        let labels = sqlx::query_as::<_, Label>(
            "SELECT id, user_id, gmail_label_id, name, color, is_default, description FROM labels WHERE user_id = ? ORDER BY is_default DESC, name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(labels)
    }
}
