use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::client::{ChatCompletion, ChatRequest, LlmError};
use super::prompts::{
    render_template, sent_date, PromptSettings, BULK_CLASSIFICATION_PROMPT,
    DEFAULT_CLASSIFICATION_PROMPT, DEFAULT_CONTENT_TEMPLATE, IMPORTANCE_PROMPT,
};
use crate::gmail::content::format_for_classification;
use crate::models::{
    Category, ClassificationResult, EmailContent, EmailDigest, GmailMessage, ImportantPick,
};

const SINGLE_TEMPERATURE: f32 = 0.3;
const SINGLE_MAX_TOKENS: u32 = 150;
const BULK_TEMPERATURE: f32 = 0.1;
const IMPORTANCE_TEMPERATURE: f32 = 0.6;
const MAX_IMPORTANT: usize = 20;

#[derive(Debug, Deserialize)]
struct RawClassification {
    classification: Option<String>,
    reason: Option<String>,
    confidence: Option<Value>,
}

impl RawClassification {
    fn into_result(self) -> Result<ClassificationResult, String> {
        let label = self
            .classification
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| "Invalid classification response from AI".to_string())?;
        let classification: Category = label.parse()?;

        let reason = self
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "No reason provided".to_string());

        // Zero or missing confidence falls back to the default
        let confidence = self
            .confidence
            .and_then(|c| c.as_f64())
            .filter(|c| *c != 0.0)
            .unwrap_or(ClassificationResult::DEFAULT_CONFIDENCE)
            .clamp(0.0, 1.0);

        Ok(ClassificationResult {
            classification,
            reason,
            confidence,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ImportanceResponse {
    #[serde(default)]
    important_emails: Vec<ImportantPick>,
}

/// Some providers wrap JSON-mode output in prose or code fences.
fn json_body(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw.trim(),
    }
}

fn parse_classification(raw: &str) -> Result<ClassificationResult, String> {
    let parsed: RawClassification =
        serde_json::from_str(json_body(raw)).map_err(|e| format!("Invalid JSON from AI: {}", e))?;
    parsed.into_result()
}

fn format_content(email: &EmailContent) -> String {
    format!(
        "From: {}\nSubject: {}\nContent: {}\nDate Sent: {}",
        email.sender,
        email.subject,
        email.content,
        sent_date(email)
    )
}

pub struct Classifier {
    llm: Arc<dyn ChatCompletion>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }

    async fn classify_single(&self, request: ChatRequest) -> ClassificationResult {
        let outcome = match self.llm.complete(&request).await {
            Ok(raw) => parse_classification(&raw),
            Err(e) => Err(e.to_string()),
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!("Classification error: {}", e);
            ClassificationResult::failed(e)
        })
    }

    /// Classifies a Gmail message. Never fails; problems yield the fallback bucket.
    pub async fn classify_message(
        &self,
        message: &GmailMessage,
        settings: &PromptSettings,
    ) -> ClassificationResult {
        let request = ChatRequest::new(
            settings.system_prompt(DEFAULT_CLASSIFICATION_PROMPT),
            format_for_classification(message),
        )
        .temperature(SINGLE_TEMPERATURE)
        .max_tokens(SINGLE_MAX_TOKENS)
        .json();

        self.classify_single(request).await
    }

    /// Classifies caller-supplied content through the prompt template.
    /// Results here never carry zero confidence, fallbacks included.
    pub async fn classify_content(
        &self,
        email: &EmailContent,
        settings: &PromptSettings,
    ) -> ClassificationResult {
        let template = settings.system_prompt(DEFAULT_CONTENT_TEMPLATE);
        let request = ChatRequest::new(render_template(&template, email), format_content(email))
            .temperature(SINGLE_TEMPERATURE)
            .max_tokens(SINGLE_MAX_TOKENS)
            .json();

        let mut result = self.classify_single(request).await;
        if result.confidence == 0.0 {
            result.confidence = ClassificationResult::DEFAULT_CONFIDENCE;
        }
        result
    }

    /// Classifies several emails in one request, keyed by email id.
    /// Entries naming an unknown bucket are dropped.
    pub async fn classify_many(
        &self,
        digests: &[EmailDigest],
        settings: &PromptSettings,
    ) -> Result<HashMap<String, ClassificationResult>, LlmError> {
        if digests.is_empty() {
            return Ok(HashMap::new());
        }

        let payload = serde_json::to_string(digests)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let request = ChatRequest::new(settings.with_preferences(BULK_CLASSIFICATION_PROMPT), payload)
            .temperature(BULK_TEMPERATURE)
            .json();

        let raw = self.llm.complete(&request).await?;
        let entries: HashMap<String, Value> = serde_json::from_str(json_body(&raw))
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to classify emails: {}", e)))?;

        let results = entries
            .into_iter()
            .filter_map(|(id, value)| {
                let parsed = serde_json::from_value::<RawClassification>(value)
                    .map_err(|e| e.to_string())
                    .and_then(RawClassification::into_result);
                match parsed {
                    Ok(result) => Some((id, result)),
                    Err(e) => {
                        tracing::debug!("Dropping classification for {}: {}", id, e);
                        None
                    }
                }
            })
            .collect();

        Ok(results)
    }

    /// Asks the model for the most important emails with a short summary each.
    pub async fn pick_important(
        &self,
        digests: &[EmailDigest],
    ) -> Result<Vec<ImportantPick>, LlmError> {
        if digests.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::to_string(digests)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let request = ChatRequest::new(IMPORTANCE_PROMPT, payload)
            .temperature(IMPORTANCE_TEMPERATURE)
            .json();

        let raw = self.llm.complete(&request).await?;
        let mut response: ImportanceResponse = serde_json::from_str(json_body(&raw))
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to analyze emails: {}", e)))?;

        response.important_emails.truncate(MAX_IMPORTANT);
        Ok(response.important_emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> ChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ChatCompletion for ScriptedLlm {
        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(LlmError::Http)
        }
    }

    fn message() -> GmailMessage {
        GmailMessage {
            id: "m1".to_string(),
            snippet: "hello".to_string(),
            ..Default::default()
        }
    }

    fn digest(id: &str) -> EmailDigest {
        EmailDigest {
            id: id.to_string(),
            subject: "Subject".to_string(),
            sender: "a@example.com".to_string(),
            content: "Body".to_string(),
            received_at: "2025-07-01T00:00:00Z".to_string(),
            snippet: None,
        }
    }

    #[tokio::test]
    async fn parses_model_answer() {
        let llm = ScriptedLlm::replying(
            r#"{"classification":"ATTN","reason":"Personal note","confidence":0.93}"#,
        );
        let classifier = Classifier::new(llm.clone());

        let result = classifier
            .classify_message(&message(), &PromptSettings::default())
            .await;

        assert_eq!(result.classification, Category::Attn);
        assert_eq!(result.reason, "Personal note");
        assert_eq!(result.confidence, 0.93);

        let request = llm.last_request();
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, Some(150));
        assert!(request.json_mode);
        assert_eq!(request.system, DEFAULT_CLASSIFICATION_PROMPT);
    }

    #[tokio::test]
    async fn fills_missing_fields_and_clamps() {
        let classifier = Classifier::new(ScriptedLlm::replying(
            "```json\n{\"classification\":\"marketing\"}\n```",
        ));
        let result = classifier
            .classify_message(&message(), &PromptSettings::default())
            .await;
        assert_eq!(result.classification, Category::Marketing);
        assert_eq!(result.reason, "No reason provided");
        assert_eq!(result.confidence, 0.8);

        let classifier = Classifier::new(ScriptedLlm::replying(
            r#"{"classification":"FK-U","reason":"scam","confidence":7}"#,
        ));
        let result = classifier
            .classify_message(&message(), &PromptSettings::default())
            .await;
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn failures_fall_back_to_hmmmm() {
        for llm in [
            ScriptedLlm::failing("connection refused"),
            ScriptedLlm::replying("not json"),
            ScriptedLlm::replying(r#"{"reason":"no bucket"}"#),
            ScriptedLlm::replying(r#"{"classification":"INBOX"}"#),
        ] {
            let result = Classifier::new(llm)
                .classify_message(&message(), &PromptSettings::default())
                .await;
            assert_eq!(result.classification, Category::Hmmmm);
            assert_eq!(result.confidence, 0.0);
            assert!(result.reason.starts_with("Classification failed: "));
        }
    }

    #[tokio::test]
    async fn custom_prompt_replaces_default() {
        let llm = ScriptedLlm::replying(r#"{"classification":"HMMMM"}"#);
        let settings = PromptSettings {
            custom_prompt: Some("Sort my mail".to_string()),
            ..Default::default()
        };

        Classifier::new(llm.clone())
            .classify_message(&message(), &settings)
            .await;
        assert_eq!(llm.last_request().system, "Sort my mail");
    }

    #[tokio::test]
    async fn content_classification_renders_template() {
        let llm = ScriptedLlm::replying(r#"{"classification":"TAKE-A-LOOK","reason":"bill"}"#);
        let email = EmailContent {
            sender: "bank@example.com".to_string(),
            subject: "Statement ready".to_string(),
            content: "Your statement is ready".to_string(),
            email_date: Some("2025-07-01".to_string()),
        };

        let result = Classifier::new(llm.clone())
            .classify_content(&email, &PromptSettings::default())
            .await;

        assert_eq!(result.classification, Category::TakeALook);
        let request = llm.last_request();
        assert!(request.system.contains("From: bank@example.com"));
        assert!(request.system.contains("Date Sent: 2025-07-01"));
        assert!(request.user.starts_with("From: bank@example.com\nSubject: Statement ready"));
    }

    #[tokio::test]
    async fn content_without_date_is_sent_as_now() {
        let llm = ScriptedLlm::replying(r#"{"classification":"ATTN"}"#);
        let email = EmailContent {
            sender: "ann@example.com".to_string(),
            subject: "Lunch".to_string(),
            content: "Noon?".to_string(),
            email_date: None,
        };

        Classifier::new(llm.clone())
            .classify_content(&email, &PromptSettings::default())
            .await;

        let request = llm.last_request();
        let sent = request.user.rsplit("Date Sent: ").next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(sent).is_ok());
        assert!(!request.user.contains("unknown"));
    }

    #[tokio::test]
    async fn content_fallback_keeps_default_confidence() {
        let email = EmailContent {
            sender: "ann@example.com".to_string(),
            subject: "Lunch".to_string(),
            content: "Noon?".to_string(),
            email_date: Some("2025-07-01".to_string()),
        };

        let result = Classifier::new(ScriptedLlm::failing("down"))
            .classify_content(&email, &PromptSettings::default())
            .await;

        assert_eq!(result.classification, Category::Hmmmm);
        assert!(result.reason.starts_with("Classification failed: "));
        assert_eq!(result.confidence, 0.8);
    }

    #[tokio::test]
    async fn bulk_classification_drops_unknown_buckets() {
        let llm = ScriptedLlm::replying(
            r#"{"a":{"classification":"ATTN","reason":"friend"},"b":{"classification":"SPAM","reason":"?"}}"#,
        );
        let results = Classifier::new(llm.clone())
            .classify_many(&[digest("a"), digest("b")], &PromptSettings::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results["a"].classification, Category::Attn);
        assert_eq!(llm.last_request().temperature, 0.1);
        assert!(llm.last_request().user.contains("\"receivedAt\""));
    }

    #[tokio::test]
    async fn bulk_classification_propagates_errors() {
        let result = Classifier::new(ScriptedLlm::replying("garbage"))
            .classify_many(&[digest("a")], &PromptSettings::default())
            .await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));

        let result = Classifier::new(ScriptedLlm::failing("down"))
            .classify_many(&[digest("a")], &PromptSettings::default())
            .await;
        assert!(matches!(result, Err(LlmError::Http(_))));
    }

    #[tokio::test]
    async fn important_picks_are_capped() {
        let picks: Vec<String> = (0..25)
            .map(|i| format!(r#"{{"id":"m{}","summary":"s{}"}}"#, i, i))
            .collect();
        let reply = format!(r#"{{"important_emails":[{}]}}"#, picks.join(","));
        let llm = ScriptedLlm::replying(&reply);

        let important = Classifier::new(llm.clone())
            .pick_important(&[digest("m0")])
            .await
            .unwrap();

        assert_eq!(important.len(), 20);
        assert_eq!(important[0].id, "m0");
        assert_eq!(important[0].summary, "s0");
        assert_eq!(llm.last_request().temperature, 0.6);
    }

    #[tokio::test]
    async fn empty_input_skips_the_model() {
        let llm = ScriptedLlm::failing("should not be called");
        let classifier = Classifier::new(llm.clone());

        assert!(classifier
            .classify_many(&[], &PromptSettings::default())
            .await
            .unwrap()
            .is_empty());
        assert!(classifier.pick_important(&[]).await.unwrap().is_empty());
        assert!(llm.requests.lock().unwrap().is_empty());
    }
}
