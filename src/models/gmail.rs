//! Wire types for the Gmail REST API (v1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailProfile {
    pub email_address: String,
    #[serde(default)]
    pub messages_total: i64,
    #[serde(default)]
    pub threads_total: i64,
    #[serde(default)]
    pub history_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailLabelColor {
    #[serde(rename = "textColor")]
    pub text_color: String,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailLabel {
    pub id: String,
    pub name: String,
    /// "system" or "user"
    #[serde(rename = "type", default)]
    pub label_type: Option<String>,
    #[serde(default)]
    pub message_list_visibility: Option<String>,
    #[serde(default)]
    pub label_list_visibility: Option<String>,
    #[serde(default)]
    pub messages_total: Option<i64>,
    #[serde(default)]
    pub messages_unread: Option<i64>,
    #[serde(default)]
    pub color: Option<GmailLabelColor>,
}

impl GmailLabel {
    pub fn is_system(&self) -> bool {
        self.label_type.as_deref() == Some("system")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmailHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailBody {
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

/// A MIME part. The top-level message payload has the same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessagePart {
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub headers: Vec<GmailHeader>,
    #[serde(default)]
    pub body: Option<GmailBody>,
    #[serde(default)]
    pub parts: Vec<GmailMessagePart>,
}

impl GmailMessagePart {
    pub fn body_data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: Option<GmailMessagePart>,
    #[serde(default)]
    pub size_estimate: i64,
    #[serde(default)]
    pub history_id: Option<String>,
    /// Epoch milliseconds, as a decimal string.
    #[serde(default)]
    pub internal_date: Option<String>,
}

impl GmailMessage {
    /// Case-insensitive header lookup on the top-level payload.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref().and_then(|p| {
            p.headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<GmailMessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub result_size_estimate: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelListResponse {
    #[serde(default)]
    pub labels: Vec<GmailLabel>,
}

/// Options for `messages.list`.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub max_results: u32,
    pub page_token: Option<String>,
    pub label_ids: Vec<String>,
    pub q: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            max_results: 100,
            page_token: None,
            label_ids: Vec::new(),
            q: None,
        }
    }
}

impl ListOptions {
    pub fn with_max_results(max_results: u32) -> Self {
        Self {
            max_results,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmailPage {
    pub emails: Vec<GmailMessage>,
    pub next_page_token: Option<String>,
}
