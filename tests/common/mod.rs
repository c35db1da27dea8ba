#![allow(dead_code)]

use actix_web::{test, web, App};
use async_trait::async_trait;
use base64::prelude::*;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use inbox_triage::{
    auth::JwtManager,
    config::AppConfig,
    gmail::{GmailConnector, GmailError, MailboxProvider, OAuthProvider, TokenSet},
    handlers,
    llm::{ChatCompletion, ChatRequest, Classifier, LlmError},
    models::{
        EmailPage, GmailBody, GmailHeader, GmailLabel, GmailMessage, GmailMessagePart,
        GmailProfile, ListOptions, User,
    },
    repositories::{
        SqliteClassificationRepository, SqliteEmailRepository, SqliteLabelRepository,
        SqlitePreferenceRepository, SqliteStatsRepository, SqliteUserRepository,
        SqliteWaitlistRepository,
    },
    scheduler::{BackgroundScheduler, ProcessingJob},
    services::{
        AccountService, ClassificationService, GmailService, PreferenceService, WaitlistService,
    },
};

pub const APP_URL: &str = "http://app.test";
pub const GMAIL_ADDRESS: &str = "owner@example.com";

/// Builds a plain-text message the way Gmail returns it with format=full.
pub fn message(id: &str, from: &str, subject: &str, body: &str, day: u32) -> GmailMessage {
    let header = |name: &str, value: &str| GmailHeader {
        name: name.to_string(),
        value: value.to_string(),
    };

    GmailMessage {
        id: id.to_string(),
        thread_id: format!("thread-{}", id),
        label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
        snippet: body.chars().take(40).collect(),
        payload: Some(GmailMessagePart {
            mime_type: "text/plain".to_string(),
            headers: vec![
                header("From", from),
                header("Subject", subject),
                header("Date", &format!("{} Jul 2025 10:00:00 +0000", day)),
            ],
            body: Some(GmailBody {
                size: body.len() as i64,
                data: Some(BASE64_URL_SAFE_NO_PAD.encode(body.as_bytes())),
                attachment_id: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Shared contents of the fake mailbox.
#[derive(Default)]
pub struct MailboxState {
    pub messages: Mutex<Vec<GmailMessage>>,
    pub labels: Mutex<Vec<GmailLabel>>,
    /// When set, profile lookups fail with this HTTP status
    pub profile_error: Mutex<Option<u16>>,
    pub list_queries: Mutex<Vec<Option<String>>>,
}

impl MailboxState {
    pub fn seed(&self, messages: Vec<GmailMessage>) {
        *self.messages.lock().unwrap() = messages;
    }
}

pub struct FakeMailbox {
    state: Arc<MailboxState>,
}

#[async_trait]
impl MailboxProvider for FakeMailbox {
    async fn list_emails(&self, options: &ListOptions) -> Result<EmailPage, GmailError> {
        self.state.list_queries.lock().unwrap().push(options.q.clone());
        let emails = self
            .state
            .messages
            .lock()
            .unwrap()
            .iter()
            .take(options.max_results as usize)
            .cloned()
            .collect();
        Ok(EmailPage {
            emails,
            next_page_token: None,
        })
    }

    async fn get_email(&self, id: &str) -> Result<GmailMessage, GmailError> {
        self.state
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| GmailError::Api {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            })
    }

    async fn list_labels(&self) -> Result<Vec<GmailLabel>, GmailError> {
        Ok(self.state.labels.lock().unwrap().clone())
    }

    async fn get_user_profile(&self) -> Result<GmailProfile, GmailError> {
        if let Some(status) = *self.state.profile_error.lock().unwrap() {
            return Err(GmailError::Api {
                status,
                message: "Invalid Credentials".to_string(),
            });
        }
        Ok(GmailProfile {
            email_address: GMAIL_ADDRESS.to_string(),
            messages_total: 1234,
            threads_total: 987,
            history_id: "1".to_string(),
        })
    }
}

pub struct FakeConnector {
    state: Arc<MailboxState>,
}

impl GmailConnector for FakeConnector {
    fn connect(&self, user: &User) -> Option<Arc<dyn MailboxProvider>> {
        user.gmail_credentials()?;
        Some(Arc::new(FakeMailbox {
            state: self.state.clone(),
        }))
    }
}

pub struct FakeOAuth;

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.test/auth?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, GmailError> {
        if code == "bad-code" {
            return Err(GmailError::Api {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(TokenSet {
            access_token: format!("access-{}", code),
            refresh_token: if code == "no-refresh" {
                None
            } else {
                Some(format!("refresh-{}", code))
            },
            expires_at: Utc::now() + Duration::hours(1),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, GmailError> {
        Ok(TokenSet {
            access_token: "refreshed".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        })
    }
}

/// Answers like a well-behaved model: ATTN for single emails, TAKE-A-LOOK
/// for every id in a bulk request, and the first email as important.
#[derive(Default)]
pub struct FakeLlm {
    pub fail: Mutex<bool>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

fn ids_in(payload: &str) -> Vec<String> {
    serde_json::from_str::<Vec<Value>>(payload)
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e["id"].as_str().map(str::to_string))
        .collect()
}

#[async_trait]
impl ChatCompletion for FakeLlm {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if *self.fail.lock().unwrap() {
            return Err(LlmError::RateLimited);
        }

        let response = if request.system.contains("important_emails") {
            let picks: Vec<Value> = ids_in(&request.user)
                .into_iter()
                .take(1)
                .map(|id| json!({ "id": id, "summary": "Worth a reply" }))
                .collect();
            json!({ "important_emails": picks })
        } else if request.system.contains("mapping email IDs") {
            let mut map = serde_json::Map::new();
            for id in ids_in(&request.user) {
                map.insert(
                    id,
                    json!({ "classification": "TAKE-A-LOOK", "reason": "Notification" }),
                );
            }
            Value::Object(map)
        } else {
            json!({ "classification": "ATTN", "reason": "Personal note", "confidence": 0.9 })
        };

        Ok(response.to_string())
    }
}

pub struct Services {
    pub gmail: Arc<GmailService>,
    pub classification: Arc<ClassificationService>,
    pub job: ProcessingJob,
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub jwt_manager: JwtManager,
    pub mailbox: Arc<MailboxState>,
    pub llm: Arc<FakeLlm>,
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        // Create temporary database
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to create database pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            jwt_manager: JwtManager::new("test_secret_key"),
            mailbox: Arc::new(MailboxState::default()),
            llm: Arc::new(FakeLlm::default()),
            temp_dir,
        }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".parse().expect("bind address"),
            jwt_secret: "test_secret_key".to_string(),
            google_client_id: "client".to_string(),
            google_client_secret: "secret".to_string(),
            google_redirect_url: "http://localhost/api/auth/callback/google-gmail".to_string(),
            app_url: APP_URL.to_string(),
            llm_base_url: "http://llm.test".to_string(),
            llm_api_key: None,
            llm_model: "test-model".to_string(),
            scheduler_enabled: false,
            scheduler_interval_secs: 300,
        }
    }

    pub fn services(&self) -> Services {
        let users = Arc::new(SqliteUserRepository::new(self.pool.clone()));
        let emails = Arc::new(SqliteEmailRepository::new(self.pool.clone()));
        let preferences = Arc::new(SqlitePreferenceRepository::new(self.pool.clone()));

        let gmail = Arc::new(GmailService::new(
            users.clone(),
            emails.clone(),
            Arc::new(SqliteLabelRepository::new(self.pool.clone())),
            Arc::new(SqliteStatsRepository::new(self.pool.clone())),
            Arc::new(FakeConnector {
                state: self.mailbox.clone(),
            }),
            Arc::new(FakeOAuth),
            self.jwt_manager.clone(),
        ));
        let classification = Arc::new(ClassificationService::new(
            gmail.clone(),
            emails,
            Arc::new(SqliteClassificationRepository::new(self.pool.clone())),
            preferences.clone(),
            Classifier::new(self.llm.clone()),
        ));
        let job = ProcessingJob::new(users, preferences, gmail.clone(), classification.clone());

        Services {
            gmail,
            classification,
            job,
        }
    }

    pub fn create_app(
        &self,
    ) -> actix_web::App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let services = self.services();
        let users = Arc::new(SqliteUserRepository::new(self.pool.clone()));
        let preferences = Arc::new(SqlitePreferenceRepository::new(self.pool.clone()));
        let waitlist = Arc::new(SqliteWaitlistRepository::new(self.pool.clone()));
        let scheduler = Arc::new(BackgroundScheduler::new(services.job, 300));

        App::new()
            .app_data(web::Data::new(self.jwt_manager.clone()))
            .app_data(web::Data::new(self.config()))
            .app_data(web::Data::from(scheduler))
            .app_data(web::Data::from(services.gmail))
            .app_data(web::Data::from(services.classification))
            .app_data(web::Data::new(AccountService::new(
                users,
                self.jwt_manager.clone(),
            )))
            .app_data(web::Data::new(PreferenceService::new(preferences)))
            .app_data(web::Data::new(WaitlistService::new(waitlist)))
            .configure(handlers::configure_routes)
    }

    /// Registers an account, logs in and returns (user id, bearer token).
    pub async fn register_and_login(&self, username: &str) -> (i64, String) {
        let app = test::init_service(self.create_app()).await;

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": username, "password": "correct horse" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "registration failed: {}", resp.status());

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": username, "password": "correct horse" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();

        let user_id = self
            .jwt_manager
            .verify_token(&token)
            .unwrap()
            .claims
            .user_id()
            .unwrap();
        (user_id, token)
    }

    /// Runs the OAuth callback for `user_id` with a valid state token.
    pub async fn connect_gmail(&self, user_id: i64) {
        let app = test::init_service(self.create_app()).await;
        let state = self.jwt_manager.generate_state_token(user_id).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/auth/google-gmail/callback")
            .set_json(json!({ "code": "good-code", "state": state }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "gmail connect failed: {}", resp.status());
    }

    /// A connected user with a bearer token.
    pub async fn connected_user(&self, username: &str) -> (i64, String) {
        let (user_id, token) = self.register_and_login(username).await;
        self.connect_gmail(user_id).await;
        (user_id, token)
    }

    pub fn seed_inbox(&self) {
        self.mailbox.seed(vec![
            message("m3", "Ann <ann@example.com>", "Dinner on Friday?", "Are you free on Friday evening?", 3),
            message("m2", "Airline <no-reply@air.example>", "Flight update", "Your flight leaves at 9:40.", 2),
            message("m1", "Shop <deals@shop.example>", "50% off", "Big sale this week only.", 1),
        ]);
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
