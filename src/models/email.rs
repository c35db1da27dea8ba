use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::models::GmailMessage;

/// Database entity for a fetched Gmail message
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Email {
    pub id: i64,
    pub user_id: i64,
    pub gmail_id: String,
    pub thread_id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub label_ids: Json<Vec<String>>,
    pub category: Option<String>,
    pub category_confidence: Option<f64>,
}

/// Header-derived fields of a message
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMetadata {
    pub subject: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NewEmail {
    pub user_id: i64,
    pub gmail_id: String,
    pub thread_id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub label_ids: Vec<String>,
}

impl NewEmail {
    pub fn from_message(user_id: i64, message: &GmailMessage, metadata: &EmailMetadata) -> Self {
        Self {
            user_id,
            gmail_id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            subject: metadata.subject.clone(),
            snippet: message.snippet.clone(),
            sender: metadata.sender.clone(),
            received_at: metadata.received_at,
            is_read: metadata.is_read,
            label_ids: message.label_ids.clone(),
        }
    }
}
