use chrono::{DateTime, Utc};

pub const STATUS_PROCESSING: &str = "PROCESSING";
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const STATUS_FAILED: &str = "FAILED";

/// Database entity: one Gmail sync batch
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessingStats {
    pub id: i64,
    pub user_id: i64,
    pub batch_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub emails_processed: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub emails_processed: i64,
    pub success_count: i64,
    pub error_count: i64,
}
