use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
