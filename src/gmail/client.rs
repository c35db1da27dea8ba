//! Read-only wrapper over the Gmail REST API (v1).
//!
//! A [`GmailClient`] acts on behalf of one user. Before every operation the
//! stored access token is refreshed when it is close to expiry, and the new
//! grant is written back through the [`UserRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::oauth::OAuthProvider;
use super::rate_limit::{RateLimiter, RetryPolicy};
use super::GmailError;
use crate::models::{
    EmailMetadata, EmailPage, GmailCredentials, GmailLabel, GmailMessage, GmailProfile,
    LabelListResponse, ListOptions, MessageListResponse, User,
};
use crate::repositories::UserRepository;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Concurrent `messages.get` calls while listing
const LIST_FANOUT: usize = 10;

const REFRESH_MARGIN_MINUTES: i64 = 5;

/// The read operations the service needs from a mailbox.
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    async fn list_emails(&self, options: &ListOptions) -> Result<EmailPage, GmailError>;
    async fn get_email(&self, id: &str) -> Result<GmailMessage, GmailError>;
    async fn list_labels(&self) -> Result<Vec<GmailLabel>, GmailError>;
    async fn get_user_profile(&self) -> Result<GmailProfile, GmailError>;
}

/// Builds a mailbox for a user, or `None` when the user holds no Gmail grant.
pub trait GmailConnector: Send + Sync {
    fn connect(&self, user: &User) -> Option<Arc<dyn MailboxProvider>>;
}

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    user_id: i64,
    credentials: Mutex<GmailCredentials>,
    oauth: Arc<dyn OAuthProvider>,
    users: Arc<dyn UserRepository>,
    limiter: RateLimiter,
}

impl GmailClient {
    pub fn new(
        http: reqwest::Client,
        user_id: i64,
        credentials: GmailCredentials,
        oauth: Arc<dyn OAuthProvider>,
        users: Arc<dyn UserRepository>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: GMAIL_API_BASE.to_string(),
            user_id,
            credentials: Mutex::new(credentials),
            oauth,
            users,
            limiter: RateLimiter::new(policy),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns a usable access token, refreshing it first when needed.
    async fn ensure_valid_token(&self) -> Result<String, GmailError> {
        let mut credentials = self.credentials.lock().await;
        let margin = Duration::minutes(REFRESH_MARGIN_MINUTES);
        if Utc::now() < credentials.expires_at - margin {
            return Ok(credentials.access_token.clone());
        }

        tracing::debug!("Refreshing Gmail access token for user {}", self.user_id);
        let tokens = self
            .oauth
            .refresh(&credentials.refresh_token)
            .await
            .map_err(|e| GmailError::TokenRefresh(e.to_string()))?;

        credentials.access_token = tokens.access_token;
        if let Some(refresh_token) = tokens.refresh_token {
            credentials.refresh_token = refresh_token;
        }
        credentials.expires_at = tokens.expires_at;

        if let Err(e) = self
            .users
            .update_gmail_tokens(
                self.user_id,
                &credentials.access_token,
                &credentials.refresh_token,
                credentials.expires_at,
            )
            .await
        {
            tracing::warn!(
                "Failed to persist refreshed Gmail token for user {}: {}",
                self.user_id,
                e
            );
        }

        Ok(credentials.access_token.clone())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GmailError> {
        let token = self.ensure_valid_token().await?;
        let url = format!("{}{}", self.base_url, path);

        self.limiter
            .execute(|| {
                let request = self.http.get(&url).bearer_auth(&token).query(query);
                async move {
                    let response = request.send().await?;
                    handle_response(response).await
                }
            })
            .await
    }

    async fn get_metadata(&self, id: &str) -> Result<GmailMessage, GmailError> {
        let query = [
            ("format", "metadata".to_string()),
            ("metadataHeaders", "From".to_string()),
            ("metadataHeaders", "Subject".to_string()),
            ("metadataHeaders", "Date".to_string()),
        ];
        self.get_json(&format!("/messages/{}", urlencoding::encode(id)), &query)
            .await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GmailError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GmailError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| GmailError::Decode(e.to_string()))
}

fn list_query(options: &ListOptions) -> Vec<(&'static str, String)> {
    let mut query = vec![("maxResults", options.max_results.to_string())];
    if let Some(ref token) = options.page_token {
        query.push(("pageToken", token.clone()));
    }
    for label in &options.label_ids {
        query.push(("labelIds", label.clone()));
    }
    if let Some(ref q) = options.q {
        query.push(("q", q.clone()));
    }
    query
}

#[async_trait]
impl MailboxProvider for GmailClient {
    async fn list_emails(&self, options: &ListOptions) -> Result<EmailPage, GmailError> {
        let list: MessageListResponse = self.get_json("/messages", &list_query(options)).await?;

        let emails = stream::iter(list.messages)
            .map(|m| async move { self.get_metadata(&m.id).await })
            .buffered(LIST_FANOUT)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(EmailPage {
            emails,
            next_page_token: list.next_page_token,
        })
    }

    async fn get_email(&self, id: &str) -> Result<GmailMessage, GmailError> {
        self.get_json(&format!("/messages/{}", urlencoding::encode(id)), &[])
            .await
    }

    async fn list_labels(&self) -> Result<Vec<GmailLabel>, GmailError> {
        let response: LabelListResponse = self.get_json("/labels", &[]).await?;
        Ok(response.labels)
    }

    async fn get_user_profile(&self) -> Result<GmailProfile, GmailError> {
        self.get_json("/profile", &[]).await
    }
}

/// Creates a [`GmailClient`] per request from the user's stored grant.
pub struct GoogleGmailConnector {
    http: reqwest::Client,
    oauth: Arc<dyn OAuthProvider>,
    users: Arc<dyn UserRepository>,
    policy: RetryPolicy,
}

impl GoogleGmailConnector {
    pub fn new(
        http: reqwest::Client,
        oauth: Arc<dyn OAuthProvider>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            http,
            oauth,
            users,
            policy: RetryPolicy::default(),
        }
    }
}

impl GmailConnector for GoogleGmailConnector {
    fn connect(&self, user: &User) -> Option<Arc<dyn MailboxProvider>> {
        let credentials = user.gmail_credentials()?;
        Some(Arc::new(GmailClient::new(
            self.http.clone(),
            user.id,
            credentials,
            self.oauth.clone(),
            self.users.clone(),
            self.policy,
        )))
    }
}

fn parse_date_header(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    // Drop a trailing "(UTC)"-style comment
    let value = match value.rfind(" (") {
        Some(idx) if value.ends_with(')') => &value[..idx],
        _ => value,
    };
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Pulls subject, sender, received time and read state from a message.
pub fn parse_email_metadata(message: &GmailMessage) -> EmailMetadata {
    let received_at = message
        .header("Date")
        .and_then(parse_date_header)
        .or_else(|| {
            message
                .internal_date
                .as_deref()
                .and_then(|ms| ms.parse::<i64>().ok())
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        })
        .unwrap_or_else(Utc::now);

    EmailMetadata {
        subject: message.header("Subject").unwrap_or_default().to_string(),
        sender: message.header("From").unwrap_or_default().to_string(),
        received_at,
        is_read: !message.label_ids.iter().any(|l| l == "UNREAD"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::TokenSet;
    use crate::models::{GmailHeader, GmailMessagePart, ServiceError};

    /// Nothing listens on the discard port, so every API call fails fast.
    const UNREACHABLE_API: &str = "http://127.0.0.1:9";

    struct StubOAuth {
        fail: bool,
        rotated_refresh_token: Option<String>,
        refreshed_with: std::sync::Mutex<Vec<String>>,
    }

    impl StubOAuth {
        fn new(fail: bool, rotated_refresh_token: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                fail,
                rotated_refresh_token: rotated_refresh_token.map(str::to_string),
                refreshed_with: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn refreshes(&self) -> Vec<String> {
            self.refreshed_with.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OAuthProvider for StubOAuth {
        fn authorization_url(&self, state: &str) -> String {
            format!("https://accounts.example/auth?state={}", state)
        }

        async fn exchange_code(&self, _code: &str) -> Result<TokenSet, GmailError> {
            Err(GmailError::Transport("not used".to_string()))
        }

        async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, GmailError> {
            self.refreshed_with
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            if self.fail {
                return Err(GmailError::Api {
                    status: 400,
                    message: "invalid_grant".to_string(),
                });
            }
            Ok(TokenSet {
                access_token: "new".to_string(),
                refresh_token: self.rotated_refresh_token.clone(),
                expires_at: Utc::now() + Duration::hours(1),
            })
        }
    }

    #[derive(Default)]
    struct TokenLog {
        updates: std::sync::Mutex<Vec<(i64, String, String)>>,
    }

    impl TokenLog {
        fn updates(&self) -> Vec<(i64, String, String)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserRepository for TokenLog {
        async fn find_by_id(&self, _id: i64) -> Result<Option<User>, ServiceError> {
            Ok(None)
        }

        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, ServiceError> {
            Ok(None)
        }

        async fn find_gmail_connected(&self) -> Result<Vec<User>, ServiceError> {
            Ok(Vec::new())
        }

        async fn create(&self, _username: &str, _password_hash: &str) -> Result<User, ServiceError> {
            Err(ServiceError::InternalError("not used".to_string()))
        }

        async fn store_gmail_grant(
            &self,
            _user_id: i64,
            _gmail_address: Option<&str>,
            _access_token: &str,
            _refresh_token: Option<&str>,
            _expires_at: DateTime<Utc>,
        ) -> Result<(), ServiceError> {
            Ok(())
        }

        async fn update_gmail_tokens(
            &self,
            user_id: i64,
            access_token: &str,
            refresh_token: &str,
            _expires_at: DateTime<Utc>,
        ) -> Result<(), ServiceError> {
            self.updates.lock().unwrap().push((
                user_id,
                access_token.to_string(),
                refresh_token.to_string(),
            ));
            Ok(())
        }

        async fn clear_gmail_tokens(&self, _user_id: i64) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn client(expires_in: Duration, oauth: Arc<StubOAuth>, users: Arc<TokenLog>) -> GmailClient {
        let credentials = GmailCredentials {
            access_token: "old".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Utc::now() + expires_in,
        };
        let policy = RetryPolicy {
            retry_delay: std::time::Duration::from_millis(1),
            max_retries: 0,
            ..RetryPolicy::default()
        };
        GmailClient::new(reqwest::Client::new(), 7, credentials, oauth, users, policy)
            .with_base_url(format!("{}/", UNREACHABLE_API))
    }

    #[tokio::test]
    async fn token_near_expiry_is_refreshed_and_persisted() {
        let oauth = StubOAuth::new(false, None);
        let users = Arc::new(TokenLog::default());
        let gmail = client(Duration::minutes(2), oauth.clone(), users.clone());

        let err = gmail.get_user_profile().await.unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_ERROR");
        assert_eq!(oauth.refreshes(), vec!["rt".to_string()]);
        // Google sent no new refresh token, so the stored one is kept
        assert_eq!(
            users.updates(),
            vec![(7, "new".to_string(), "rt".to_string())]
        );

        // The refreshed grant is good for an hour
        gmail.get_user_profile().await.unwrap_err();
        assert_eq!(oauth.refreshes().len(), 1);
        assert_eq!(users.updates().len(), 1);
    }

    #[tokio::test]
    async fn rotated_refresh_token_replaces_stored_one() {
        let oauth = StubOAuth::new(false, Some("rt2"));
        let users = Arc::new(TokenLog::default());
        let gmail = client(-Duration::minutes(1), oauth.clone(), users.clone());

        gmail.list_labels().await.unwrap_err();
        assert_eq!(
            users.updates(),
            vec![(7, "new".to_string(), "rt2".to_string())]
        );
    }

    #[tokio::test]
    async fn fresh_token_is_used_as_is() {
        let oauth = StubOAuth::new(false, None);
        let users = Arc::new(TokenLog::default());
        let gmail = client(Duration::minutes(60), oauth.clone(), users.clone());

        let err = gmail.get_email("abc").await.unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_ERROR");
        assert!(oauth.refreshes().is_empty());
        assert!(users.updates().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_is_a_token_refresh_error() {
        let oauth = StubOAuth::new(true, None);
        let users = Arc::new(TokenLog::default());
        let gmail = client(Duration::minutes(1), oauth.clone(), users.clone());

        let err = gmail.get_user_profile().await.unwrap_err();
        assert_eq!(err.code(), "TOKEN_REFRESH_ERROR");
        assert!(err.invalidates_grant());
        assert_eq!(oauth.refreshes().len(), 1);
        assert!(users.updates().is_empty());
    }

    fn message(headers: &[(&str, &str)], labels: &[&str], internal_date: Option<&str>) -> GmailMessage {
        GmailMessage {
            id: "abc".to_string(),
            label_ids: labels.iter().map(|l| l.to_string()).collect(),
            internal_date: internal_date.map(str::to_string),
            payload: Some(GmailMessagePart {
                headers: headers
                    .iter()
                    .map(|(name, value)| GmailHeader {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn metadata_reads_headers_case_insensitively() {
        let msg = message(
            &[
                ("SUBJECT", "Quarterly report"),
                ("from", "Ann <ann@example.com>"),
                ("Date", "Tue, 1 Jul 2025 10:00:00 +0200"),
            ],
            &["INBOX"],
            None,
        );
        let meta = parse_email_metadata(&msg);

        assert_eq!(meta.subject, "Quarterly report");
        assert_eq!(meta.sender, "Ann <ann@example.com>");
        assert_eq!(meta.received_at.to_rfc3339(), "2025-07-01T08:00:00+00:00");
        assert!(meta.is_read);
    }

    #[test]
    fn unread_label_marks_unread() {
        let meta = parse_email_metadata(&message(&[], &["INBOX", "UNREAD"], None));
        assert!(!meta.is_read);
        assert_eq!(meta.subject, "");
    }

    #[test]
    fn date_falls_back_to_internal_date() {
        let msg = message(&[("Date", "not a date")], &[], Some("1700000000000"));
        let meta = parse_email_metadata(&msg);
        assert_eq!(meta.received_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn date_header_with_zone_comment() {
        let parsed = parse_date_header("Wed, 2 Jul 2025 09:30:00 +0000 (UTC)");
        assert_eq!(
            parsed.map(|d| d.to_rfc3339()),
            Some("2025-07-02T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn list_query_repeats_label_ids() {
        let options = ListOptions {
            max_results: 25,
            page_token: Some("next".to_string()),
            label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
            q: Some("after:1700000000".to_string()),
        };
        let query = list_query(&options);

        assert_eq!(query[0], ("maxResults", "25".to_string()));
        assert!(query.contains(&("pageToken", "next".to_string())));
        assert_eq!(query.iter().filter(|(k, _)| *k == "labelIds").count(), 2);
        assert!(query.contains(&("q", "after:1700000000".to_string())));
    }
}
