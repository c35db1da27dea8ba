use crate::models::{ServiceError, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, password_hash, gmail_address, gmail_access_token, gmail_refresh_token, token_expires_at, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError>;
    async fn find_gmail_connected(&self) -> Result<Vec<User>, ServiceError>;
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, ServiceError>;
    /// Stores a fresh grant; a missing refresh token keeps the stored one.
    async fn store_gmail_grant(
        &self,
        user_id: i64,
        gmail_address: Option<&str>,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServiceError>;
    async fn update_gmail_tokens(
        &self,
        user_id: i64,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServiceError>;
    async fn clear_gmail_tokens(&self, user_id: i64) -> Result<(), ServiceError>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_gmail_connected(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE gmail_access_token IS NOT NULL AND gmail_refresh_token IS NOT NULL AND token_expires_at IS NOT NULL ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, ServiceError> {
        let result = sqlx::query("INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(ServiceError::Conflict(format!(
                    "Username {} is already taken",
                    username
                )));
            }
            Err(e) => return Err(e.into()),
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::DatabaseError("Inserted user not found".to_string()))
    }

    async fn store_gmail_grant(
        &self,
        user_id: i64,
        gmail_address: Option<&str>,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            "UPDATE users SET gmail_address = COALESCE(?, gmail_address), gmail_access_token = ?, gmail_refresh_token = COALESCE(?, gmail_refresh_token), token_expires_at = ? WHERE id = ?",
        )
        .bind(gmail_address)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_gmail_tokens(
        &self,
        user_id: i64,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            "UPDATE users SET gmail_access_token = ?, gmail_refresh_token = ?, token_expires_at = ? WHERE id = ?",
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_gmail_tokens(&self, user_id: i64) -> Result<(), ServiceError> {
        sqlx::query(
            "UPDATE users SET gmail_access_token = NULL, gmail_refresh_token = NULL, token_expires_at = NULL WHERE id = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
