use std::collections::HashMap;
use std::sync::Arc;

use crate::llm::{Classifier, PromptSettings};
use crate::models::{
    BatchResponse, ClassificationData, ClassificationResult, ClassifiedEmailData,
    ClassifyEmailResponse, ContentBatchInput, ContentBatchItem, EmailContent, EmailContentInput,
    EmailDigest, FreshlyClassifiedEmail, ImportantEmail, NewClassifiedEmail, RecentEmail,
    ServiceError, StoredBatchItem,
};
use crate::repositories::{ClassificationRepository, EmailRepository, PreferenceRepository};
use crate::services::GmailService;

pub const DEFAULT_BATCH_SIZE: i64 = 10;
pub const CLASSIFIED_VIEW_LIMIT: i64 = 20;

fn digest(email: &RecentEmail) -> EmailDigest {
    EmailDigest {
        id: email.summary.id.clone(),
        subject: email.summary.subject.clone(),
        sender: email.summary.sender.clone(),
        content: email.content.clone(),
        received_at: email.summary.received_at.to_rfc3339(),
        snippet: Some(email.summary.snippet.clone()),
    }
}

fn batch<T>(results: Vec<T>, succeeded: impl Fn(&T) -> bool) -> BatchResponse<T> {
    let successful = results.iter().filter(|r| succeeded(r)).count();
    BatchResponse {
        processed: results.len(),
        successful,
        failed: results.len() - successful,
        results,
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub struct ClassificationService {
    gmail: Arc<GmailService>,
    emails: Arc<dyn EmailRepository>,
    classifications: Arc<dyn ClassificationRepository>,
    preferences: Arc<dyn PreferenceRepository>,
    classifier: Classifier,
}

impl ClassificationService {
    pub fn new(
        gmail: Arc<GmailService>,
        emails: Arc<dyn EmailRepository>,
        classifications: Arc<dyn ClassificationRepository>,
        preferences: Arc<dyn PreferenceRepository>,
        classifier: Classifier,
    ) -> Self {
        Self {
            gmail,
            emails,
            classifications,
            preferences,
            classifier,
        }
    }

    async fn prompt_settings(&self, user_id: i64) -> Result<PromptSettings, ServiceError> {
        let preference = self.preferences.find_by_user(user_id).await?;
        Ok(PromptSettings::from_preference(preference.as_ref()))
    }

    /// Stores the result and tags the local email row when there is one.
    async fn record(
        &self,
        user_id: i64,
        email_id: &str,
        result: &ClassificationResult,
    ) -> Result<(), ServiceError> {
        self.classifications
            .upsert_classification(user_id, email_id, result)
            .await?;
        self.emails
            .set_category(
                user_id,
                email_id,
                result.classification.as_str(),
                result.confidence,
            )
            .await?;
        Ok(())
    }

    pub async fn classify_email(
        &self,
        user_id: i64,
        email_id: &str,
    ) -> Result<ClassifyEmailResponse, ServiceError> {
        let mailbox = self.gmail.mailbox(user_id).await?;
        let message = mailbox.get_email(email_id).await?;
        let settings = self.prompt_settings(user_id).await?;

        let result = self.classifier.classify_message(&message, &settings).await;
        self.record(user_id, email_id, &result).await?;

        Ok(ClassifyEmailResponse {
            success: true,
            email_id: email_id.to_string(),
            classification: result.classification,
            reason: result.reason,
            confidence: result.confidence,
        })
    }

    /// Classifies the newest stored emails one after another. `None` when
    /// there is nothing to classify.
    pub async fn classify_stored(
        &self,
        user_id: i64,
        batch_size: i64,
        only_new: bool,
    ) -> Result<Option<BatchResponse<StoredBatchItem>>, ServiceError> {
        let stored = self
            .emails
            .find_recent(user_id, batch_size.max(1), only_new)
            .await?;
        if stored.is_empty() {
            return Ok(None);
        }

        let mailbox = self.gmail.mailbox(user_id).await?;
        let settings = self.prompt_settings(user_id).await?;

        let mut results = Vec::with_capacity(stored.len());
        for email in stored {
            let outcome = match mailbox.get_email(&email.gmail_id).await {
                Ok(message) => {
                    let result = self.classifier.classify_message(&message, &settings).await;
                    self.record(user_id, &email.gmail_id, &result)
                        .await
                        .map(|_| result.classification)
                }
                Err(e) => Err(e.into()),
            };

            results.push(match outcome {
                Ok(classification) => StoredBatchItem {
                    email_id: email.gmail_id,
                    success: true,
                    classification: Some(classification),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Error classifying email {}: {}", email.gmail_id, e);
                    StoredBatchItem {
                        email_id: email.gmail_id,
                        success: false,
                        classification: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        Ok(Some(batch(results, |r| r.success)))
    }

    /// Classifies caller-supplied content. Ids naming a stored email are recorded.
    pub async fn classify_provided(
        &self,
        user_id: i64,
        inputs: Vec<EmailContentInput>,
    ) -> Result<BatchResponse<ContentBatchItem>, ServiceError> {
        if inputs.is_empty() {
            return Err(ServiceError::ValidationError(
                "Valid email array is required".to_string(),
            ));
        }

        let settings = self.prompt_settings(user_id).await?;
        let mut results = Vec::with_capacity(inputs.len());

        for input in inputs {
            let echo = ContentBatchInput {
                sender: input.sender.clone(),
                subject: input.subject.clone(),
                date: input.email_date.clone(),
            };

            let (Some(sender), Some(subject), Some(content)) = (
                required(&input.sender),
                required(&input.subject),
                required(&input.content),
            ) else {
                results.push(ContentBatchItem {
                    input: echo,
                    success: false,
                    classification: None,
                    reason: None,
                    confidence: None,
                    error: Some("Missing required email fields".to_string()),
                });
                continue;
            };

            let email = EmailContent {
                sender: sender.to_string(),
                subject: subject.to_string(),
                content: content.to_string(),
                email_date: input.email_date.clone(),
            };
            let result = self.classifier.classify_content(&email, &settings).await;

            let stored_id = match input.id.as_deref() {
                Some(id) => self
                    .emails
                    .find_by_gmail_id(user_id, id)
                    .await?
                    .map(|email| email.gmail_id),
                None => None,
            };
            if let Some(id) = stored_id {
                self.record(user_id, &id, &result).await?;
            }

            results.push(ContentBatchItem {
                input: echo,
                success: true,
                classification: Some(result.classification),
                reason: Some(result.reason),
                confidence: Some(result.confidence),
                error: None,
            });
        }

        Ok(batch(results, |r| r.success))
    }

    /// The newest rows of the classified view.
    pub async fn classified_emails(&self, user_id: i64) -> Result<Vec<ClassifiedEmailData>, ServiceError> {
        let rows = self
            .classifications
            .find_recent_classified(user_id, CLASSIFIED_VIEW_LIMIT)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClassifiedEmailData {
                id: row.gmail_id,
                subject: row.subject,
                snippet: row.snippet,
                sender: row.sender,
                received_at: row.received_at,
                is_read: row.is_read,
                classification_type: row.classification_type,
                classification_reason: row.classification_reason,
            })
            .collect())
    }

    /// Classifies recent mail in one request and refreshes the classified view.
    pub async fn classify_recent(
        &self,
        user_id: i64,
    ) -> Result<Vec<FreshlyClassifiedEmail>, ServiceError> {
        let recent = self.gmail.recent(user_id).await?;
        let settings = self.prompt_settings(user_id).await?;

        let digests: Vec<EmailDigest> = recent.iter().map(digest).collect();
        let mut results: HashMap<String, ClassificationResult> =
            self.classifier.classify_many(&digests, &settings).await?;

        let mut classified = Vec::new();
        for email in recent {
            let Some(result) = results.remove(&email.summary.id) else {
                continue;
            };

            self.classifications
                .upsert_classified_email(&NewClassifiedEmail {
                    gmail_id: email.summary.id.clone(),
                    user_id,
                    thread_id: email.summary.thread_id.clone(),
                    subject: email.summary.subject.clone(),
                    snippet: email.summary.snippet.clone(),
                    sender: email.summary.sender.clone(),
                    received_at: email.summary.received_at,
                    is_read: email.summary.is_read,
                    label_ids: email.summary.label_ids.clone(),
                    content: email.content.clone(),
                    classification_type: result.classification.as_str().to_string(),
                    classification_reason: result.reason.clone(),
                })
                .await?;

            classified.push(FreshlyClassifiedEmail {
                email,
                classification: ClassificationData {
                    classification: result.classification,
                    reason: result.reason,
                },
            });
        }

        Ok(classified)
    }

    /// Recent mail the model picked as most important, each with a summary.
    pub async fn important(&self, user_id: i64) -> Result<Vec<ImportantEmail>, ServiceError> {
        let recent = self.gmail.recent(user_id).await?;
        let digests: Vec<EmailDigest> = recent.iter().map(digest).collect();

        let mut summaries: HashMap<String, String> = self
            .classifier
            .pick_important(&digests)
            .await?
            .into_iter()
            .map(|pick| (pick.id, pick.summary))
            .collect();

        Ok(recent
            .into_iter()
            .filter_map(|email| {
                let summary = summaries.remove(&email.summary.id)?;
                Some(ImportantEmail { email, summary })
            })
            .collect())
    }

    /// Background pass: classifies up to `limit` uncategorised stored emails.
    pub async fn classify_pending(&self, user_id: i64, limit: i64) -> Result<usize, ServiceError> {
        let outcome = self.classify_stored(user_id, limit, true).await?;
        Ok(outcome.map(|b| b.successful).unwrap_or(0))
    }
}
