use chrono::{Duration, Local, Utc};
use futures::{stream, StreamExt};
use std::sync::Arc;

use crate::auth::JwtManager;
use crate::gmail::content::{clean_email_content, extract_display_content, extract_plain_content};
use crate::gmail::{parse_email_metadata, GmailConnector, MailboxProvider, OAuthProvider};
use crate::models::{
    BatchOutcome, ConnectionError, ConnectionResponse, ConnectionStats, EmailContentResponse,
    EmailListResponse, EmailSummary, GmailMessage, LabelColorData, LabelData, ListOptions,
    NewEmail, NewLabel, RecentEmail, ServiceError, SyncResponse, User, STATUS_COMPLETED,
    STATUS_FAILED,
};
use crate::repositories::{EmailRepository, LabelRepository, StatsRepository, UserRepository};

pub const SYNC_BATCH_SIZE: u32 = 100;
pub const RECENT_LIMIT: u32 = 100;
pub const TODAY_LIMIT: u32 = 50;

/// Concurrent full-message fetches for the recent view
const CONTENT_FANOUT: usize = 10;

/// Normalised listing entry for a Gmail message.
pub fn summarize(message: &GmailMessage) -> EmailSummary {
    let metadata = parse_email_metadata(message);
    EmailSummary {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: metadata.subject,
        snippet: message.snippet.clone(),
        sender: metadata.sender,
        received_at: metadata.received_at,
        is_read: metadata.is_read,
        label_ids: message.label_ids.clone(),
    }
}

/// Start of the current local day, as epoch seconds.
fn local_midnight_epoch() -> i64 {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| (Utc::now() - Duration::hours(24)).timestamp())
}

pub struct GmailService {
    users: Arc<dyn UserRepository>,
    emails: Arc<dyn EmailRepository>,
    labels: Arc<dyn LabelRepository>,
    stats: Arc<dyn StatsRepository>,
    connector: Arc<dyn GmailConnector>,
    oauth: Arc<dyn OAuthProvider>,
    jwt_manager: JwtManager,
}

impl GmailService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        emails: Arc<dyn EmailRepository>,
        labels: Arc<dyn LabelRepository>,
        stats: Arc<dyn StatsRepository>,
        connector: Arc<dyn GmailConnector>,
        oauth: Arc<dyn OAuthProvider>,
        jwt_manager: JwtManager,
    ) -> Self {
        Self {
            users,
            emails,
            labels,
            stats,
            connector,
            oauth,
            jwt_manager,
        }
    }

    async fn find_user(&self, user_id: i64) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::AuthenticationError("User not found".to_string()))
    }

    /// The user's mailbox, or `GmailNotConnected` when no grant is stored.
    pub async fn mailbox(&self, user_id: i64) -> Result<Arc<dyn MailboxProvider>, ServiceError> {
        let user = self.find_user(user_id).await?;
        self.connector
            .connect(&user)
            .ok_or(ServiceError::GmailNotConnected)
    }

    pub fn authorization_url(&self, user_id: i64) -> Result<String, ServiceError> {
        let state = self
            .jwt_manager
            .generate_state_token(user_id)
            .map_err(|_| ServiceError::InternalError("Failed to generate OAuth state".to_string()))?;
        Ok(self.oauth.authorization_url(&state))
    }

    /// Finishes the consent flow: resolves the user from `state`, exchanges
    /// the code and stores the grant. Returns the user id.
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<i64, ServiceError> {
        let user_id = self
            .jwt_manager
            .verify_state_token(state)
            .ok_or_else(|| ServiceError::ValidationError("Invalid OAuth state".to_string()))?;
        let user = self.find_user(user_id).await?;

        let tokens = self.oauth.exchange_code(code).await?;

        let granted = User {
            gmail_access_token: Some(tokens.access_token.clone()),
            gmail_refresh_token: tokens
                .refresh_token
                .clone()
                .or_else(|| user.gmail_refresh_token.clone()),
            token_expires_at: Some(tokens.expires_at),
            ..user
        };

        let gmail_address = match self.connector.connect(&granted) {
            Some(mailbox) => match mailbox.get_user_profile().await {
                Ok(profile) => Some(profile.email_address),
                Err(e) => {
                    tracing::warn!("Could not read Gmail profile for user {}: {}", user_id, e);
                    None
                }
            },
            None => None,
        };

        self.users
            .store_gmail_grant(
                user_id,
                gmail_address.as_deref(),
                &tokens.access_token,
                tokens.refresh_token.as_deref(),
                tokens.expires_at,
            )
            .await?;

        tracing::info!("Connected Gmail for user {}", user_id);
        Ok(user_id)
    }

    pub async fn connection_status(&self, user_id: i64) -> Result<ConnectionResponse, ServiceError> {
        let user = self.find_user(user_id).await?;
        let Some(mailbox) = self.connector.connect(&user) else {
            return Ok(ConnectionResponse {
                connected: false,
                email: None,
                stats: None,
                error: None,
            });
        };

        let profile = match mailbox.get_user_profile().await {
            Ok(profile) => profile,
            Err(e) if e.invalidates_grant() => {
                tracing::warn!("Gmail grant for user {} rejected, clearing tokens: {}", user_id, e);
                self.users.clear_gmail_tokens(user_id).await?;
                return Ok(ConnectionResponse {
                    connected: false,
                    email: None,
                    stats: None,
                    error: Some(ConnectionError {
                        message: e.to_string(),
                        code: e.code().to_string(),
                    }),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let last_sync = self
            .stats
            .latest_completed(user_id)
            .await?
            .and_then(|batch| batch.end_time);

        Ok(ConnectionResponse {
            connected: true,
            email: Some(profile.email_address),
            stats: Some(ConnectionStats {
                messages_total: profile.messages_total,
                threads_total: profile.threads_total,
                last_sync,
            }),
            error: None,
        })
    }

    /// Lists messages and records the ones not stored yet.
    pub async fn list_emails(
        &self,
        user_id: i64,
        options: &ListOptions,
    ) -> Result<EmailListResponse, ServiceError> {
        let mailbox = self.mailbox(user_id).await?;
        let page = mailbox.list_emails(options).await?;

        let mut emails = Vec::with_capacity(page.emails.len());
        for message in &page.emails {
            let metadata = parse_email_metadata(message);
            self.emails
                .insert_if_absent(&NewEmail::from_message(user_id, message, &metadata))
                .await?;
            emails.push(summarize(message));
        }

        Ok(EmailListResponse {
            emails,
            next_page_token: page.next_page_token,
        })
    }

    pub async fn today(&self, user_id: i64) -> Result<EmailListResponse, ServiceError> {
        let options = ListOptions {
            q: Some(format!("after:{}", local_midnight_epoch())),
            ..ListOptions::with_max_results(TODAY_LIMIT)
        };
        self.list_emails(user_id, &options).await
    }

    /// Pulls the newest messages into the store and records the batch.
    pub async fn sync(&self, user_id: i64) -> Result<SyncResponse, ServiceError> {
        let mailbox = self.mailbox(user_id).await?;
        let batch_id = format!("sync-{}", Utc::now().timestamp_millis());
        let stats_id = self.stats.start_batch(user_id, &batch_id).await?;

        match self.sync_batch(user_id, mailbox.as_ref()).await {
            Ok((outcome, total)) => {
                self.stats
                    .finish_batch(stats_id, &outcome, STATUS_COMPLETED)
                    .await?;
                tracing::info!(
                    "Sync {} for user {}: {} stored, {} failed",
                    batch_id,
                    user_id,
                    outcome.success_count,
                    outcome.error_count
                );
                Ok(SyncResponse {
                    status: "success".to_string(),
                    processed: outcome.success_count as usize,
                    total,
                    batch_id,
                })
            }
            Err(e) => {
                if let Err(stats_err) = self
                    .stats
                    .finish_batch(stats_id, &BatchOutcome::default(), STATUS_FAILED)
                    .await
                {
                    tracing::error!("Failed to close sync batch {}: {}", batch_id, stats_err);
                }
                Err(e)
            }
        }
    }

    async fn sync_batch(
        &self,
        user_id: i64,
        mailbox: &dyn MailboxProvider,
    ) -> Result<(BatchOutcome, i64), ServiceError> {
        let page = mailbox
            .list_emails(&ListOptions::with_max_results(SYNC_BATCH_SIZE))
            .await?;

        let mut outcome = BatchOutcome::default();
        for message in &page.emails {
            outcome.emails_processed += 1;
            let metadata = parse_email_metadata(message);
            match self
                .emails
                .upsert(&NewEmail::from_message(user_id, message, &metadata))
                .await
            {
                Ok(()) => outcome.success_count += 1,
                Err(e) => {
                    tracing::warn!("Failed to store message {}: {}", message.id, e);
                    outcome.error_count += 1;
                }
            }
        }

        let profile = mailbox.get_user_profile().await?;
        Ok((outcome, profile.messages_total))
    }

    pub async fn email_content(
        &self,
        user_id: i64,
        email_id: &str,
    ) -> Result<EmailContentResponse, ServiceError> {
        let mailbox = self.mailbox(user_id).await?;
        let message = mailbox.get_email(email_id).await?;
        let metadata = parse_email_metadata(&message);

        Ok(EmailContentResponse {
            content: extract_display_content(&message),
            id: message.id,
            thread_id: message.thread_id,
            subject: metadata.subject,
            sender: metadata.sender,
            received_at: metadata.received_at,
            snippet: message.snippet,
        })
    }

    /// Mirrors Gmail labels locally and returns everything stored for the user.
    pub async fn labels(&self, user_id: i64) -> Result<Vec<LabelData>, ServiceError> {
        let mailbox = self.mailbox(user_id).await?;
        for label in mailbox.list_labels().await? {
            self.labels
                .insert_if_absent(&NewLabel::from_gmail(user_id, &label))
                .await?;
        }

        let labels = self
            .labels
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(|label| LabelData {
                color: label
                    .color_pair()
                    .map(|(background_color, text_color)| LabelColorData {
                        background_color,
                        text_color,
                    }),
                id: label.id,
                name: label.name,
                gmail_label_id: label.gmail_label_id,
                is_default: label.is_default,
                description: label.description,
            })
            .collect();

        Ok(labels)
    }

    /// Newest messages with cleaned plain-text bodies. Nothing is stored.
    pub async fn recent(&self, user_id: i64) -> Result<Vec<RecentEmail>, ServiceError> {
        let mailbox = self.mailbox(user_id).await?;
        let page = mailbox
            .list_emails(&ListOptions::with_max_results(RECENT_LIMIT))
            .await?;

        let emails = stream::iter(page.emails)
            .map(|message| {
                let mailbox = mailbox.clone();
                async move {
                    let content = match mailbox.get_email(&message.id).await {
                        Ok(full) => clean_email_content(&extract_plain_content(&full)),
                        Err(e) => {
                            tracing::warn!("Failed to fetch content for {}: {}", message.id, e);
                            String::new()
                        }
                    };
                    RecentEmail {
                        summary: summarize(&message),
                        content,
                    }
                }
            })
            .buffered(CONTENT_FANOUT)
            .collect::<Vec<_>>()
            .await;

        Ok(emails)
    }
}
