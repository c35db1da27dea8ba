use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// Query string Google appends to the redirect URI
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OAuthCallbackBody {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEmailsQuery {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
    /// Comma-separated label ids
    pub label_ids: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyEmailRequest {
    pub email_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyStoredQuery {
    pub batch_size: Option<i64>,
    /// Anything other than the literal `true` counts as false
    pub only_new: Option<String>,
}

impl ClassifyStoredQuery {
    pub fn only_new(&self) -> bool {
        self.only_new.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmailContentInput {
    pub id: Option<String>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub email_date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassifyContentBatchRequest {
    pub emails: Option<Vec<EmailContentInput>>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifiedViewQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesForm {
    pub custom_prompt: Option<String>,
    pub priority_senders: Option<Vec<String>>,
    pub ignored_senders: Option<Vec<String>>,
    pub content_keywords: Option<Vec<String>>,
    pub processing_frequency: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub processing_schedule: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSettingsForm {
    /// Must be a JSON string; anything else is rejected
    #[schema(value_type = Option<String>)]
    pub classification_prompt: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WaitlistForm {
    pub email: Option<String>,
}
