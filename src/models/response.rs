use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, ProcessingFrequency};

// Common response types
#[derive(Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}

// Authentication responses
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_in: u64, // seconds
}

#[derive(Serialize, ToSchema)]
pub struct AuthUrlResponse {
    pub success: bool,
    pub auth_url: String,
}

// Gmail connection
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub messages_total: i64,
    pub threads_total: i64,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct ConnectionError {
    pub message: String,
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConnectionResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConnectionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ConnectionError>,
}

// Email listings
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub label_ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailListResponse {
    pub emails: Vec<EmailSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub status: String,
    pub processed: usize,
    pub total: i64,
    pub batch_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailContentResponse {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub content: String,
    pub snippet: String,
}

/// Summary plus cleaned body text
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentEmail {
    #[serde(flatten)]
    pub summary: EmailSummary,
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct RecentEmailsResponse {
    pub emails: Vec<RecentEmail>,
}

#[derive(Serialize, ToSchema)]
pub struct ImportantEmail {
    #[serde(flatten)]
    pub email: RecentEmail,
    pub summary: String,
}

#[derive(Serialize, ToSchema)]
pub struct ImportantEmailsResponse {
    pub emails: Vec<ImportantEmail>,
}

// Labels
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelColorData {
    pub background_color: String,
    pub text_color: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    pub id: i64,
    pub name: String,
    pub gmail_label_id: String,
    pub color: Option<LabelColorData>,
    pub is_default: bool,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LabelsResponse {
    pub labels: Vec<LabelData>,
}

// Classification
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyEmailResponse {
    pub success: bool,
    pub email_id: String,
    pub classification: Category,
    pub reason: String,
    pub confidence: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredBatchItem {
    pub email_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentBatchInput {
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContentBatchItem {
    pub input: ContentBatchInput,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct BatchResponse<T> {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<T>,
}

#[derive(Serialize, ToSchema)]
pub struct ClassificationData {
    pub classification: Category,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct FreshlyClassifiedEmail {
    #[serde(flatten)]
    pub email: RecentEmail,
    pub classification: ClassificationData,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEmailData {
    pub id: String,
    pub subject: String,
    pub snippet: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub classification_type: Option<String>,
    pub classification_reason: Option<String>,
}

// Preferences
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesData {
    pub custom_prompt: String,
    pub priority_senders: Vec<String>,
    pub ignored_senders: Vec<String>,
    pub content_keywords: Vec<String>,
    pub processing_frequency: ProcessingFrequency,
    #[schema(value_type = Option<Object>)]
    pub processing_schedule: Option<serde_json::Value>,
    pub last_processed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct PreferencesUpdateResponse {
    pub message: String,
    pub preferences: PreferencesData,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSettingsResponse {
    pub classification_prompt: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPreferencesResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    pub synced: bool,
}

// System status responses
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct TaskStatusData {
    pub running: bool,
    pub interval_secs: u64,
}

#[derive(Serialize, ToSchema)]
pub struct TaskStatusResponse {
    pub success: bool,
    pub status: TaskStatusData,
}
