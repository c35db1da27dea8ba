use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The five triage buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    #[serde(rename = "ATTN")]
    Attn,
    #[serde(rename = "FK-U")]
    FkU,
    #[serde(rename = "MARKETING")]
    Marketing,
    #[serde(rename = "TAKE-A-LOOK")]
    TakeALook,
    #[serde(rename = "HMMMM")]
    Hmmmm,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Attn,
        Category::FkU,
        Category::Marketing,
        Category::TakeALook,
        Category::Hmmmm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Attn => "ATTN",
            Category::FkU => "FK-U",
            Category::Marketing => "MARKETING",
            Category::TakeALook => "TAKE-A-LOOK",
            Category::Hmmmm => "HMMMM",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['_', ' '], "-");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown classification: {}", s.trim()))
    }
}

/// Outcome of classifying one email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub classification: Category,
    pub reason: String,
    pub confidence: f64,
}

impl ClassificationResult {
    pub const DEFAULT_CONFIDENCE: f64 = 0.8;

    /// The result recorded when the model call or its output is unusable.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            classification: Category::Hmmmm,
            reason: format!("Classification failed: {}", error),
            confidence: 0.0,
        }
    }
}

/// Database entity: snapshot shown in the classified view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassifiedEmail {
    pub id: i64,
    pub gmail_id: String,
    pub user_id: i64,
    pub thread_id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub label_ids: Json<Vec<String>>,
    pub content: String,
    pub classification_type: Option<String>,
    pub classification_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClassifiedEmail {
    pub gmail_id: String,
    pub user_id: i64,
    pub thread_id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub label_ids: Vec<String>,
    pub content: String,
    pub classification_type: String,
    pub classification_reason: String,
}

/// Caller-supplied email content for template classification
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub sender: String,
    pub subject: String,
    pub content: String,
    pub email_date: Option<String>,
}

/// Compact per-email record sent to multi-email prompts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDigest {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub content: String,
    pub received_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportantPick {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}
