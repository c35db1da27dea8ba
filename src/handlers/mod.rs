pub mod auth;
pub mod classification;
pub mod gmail;
pub mod oauth;
pub mod preferences;
pub mod system;

use actix_web::{web, HttpRequest};

use crate::auth::JwtManager;
use crate::middleware::auth::authenticate_request;
use crate::models::ServiceError;

// Re-export all handler functions for easy importing
pub use auth::*;
pub use classification::*;
pub use gmail::*;
pub use oauth::*;
pub use preferences::*;
pub use system::*;

/// Routes reachable without a session token.
const PUBLIC_ROUTES: &[&str] = &[
    "/api/register",
    "/api/login",
    "/api/auth/callback/google-gmail",
    "/api/auth/google-gmail/callback",
    "/api/waitlist",
    "/api/health",
];

/// Maps a body or query extraction failure onto the error envelope.
/// Protected routes report a missing session before a malformed payload.
fn extractor_error(message: String, req: &HttpRequest) -> actix_web::Error {
    if !PUBLIC_ROUTES.contains(&req.path()) {
        if let Some(jwt_manager) = req.app_data::<web::Data<JwtManager>>() {
            if let Err(e) = authenticate_request(req, jwt_manager) {
                return e.into();
            }
        }
    }
    tracing::debug!("Rejecting request to {}: {}", req.path(), message);
    ServiceError::ValidationError(message).into()
}

/// Registers every API route. Shared by the server and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        extractor_error(format!("Invalid request body: {}", err), req)
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        extractor_error(format!("Invalid query string: {}", err), req)
    }));

    cfg
        // Accounts
        .route("/api/register", web::post().to(register_api))
        .route("/api/login", web::post().to(login_api))
        .route("/api/logout", web::post().to(logout_api))
        // Gmail OAuth
        .route("/api/auth/google-gmail", web::get().to(gmail_auth_url))
        .route("/api/auth/callback/google-gmail", web::get().to(gmail_oauth_redirect))
        .route("/api/auth/google-gmail/callback", web::post().to(gmail_oauth_callback))
        // Gmail
        .route("/api/gmail/connection", web::get().to(gmail_connection))
        .route("/api/gmail/emails", web::get().to(list_emails))
        .route("/api/gmail/emails", web::post().to(sync_emails))
        .route("/api/gmail/today", web::get().to(today_emails))
        .route("/api/gmail/emails/classify", web::post().to(classify_email))
        .route("/api/gmail/emails/classify", web::get().to(classify_stored))
        .route("/api/gmail/emails/classify/batch", web::post().to(classify_batch))
        .route("/api/gmail/emails/{id}/content", web::get().to(email_content))
        .route("/api/gmail/labels", web::get().to(labels))
        .route("/api/gmail/recent", web::get().to(recent_emails))
        .route("/api/gmail/important", web::get().to(important_emails))
        .route("/api/gmail/classify", web::get().to(classified_view))
        // Preferences
        .route("/api/preferences", web::get().to(get_preferences))
        .route("/api/preferences", web::post().to(save_preferences))
        .route("/api/user/classification-settings", web::get().to(get_classification_settings))
        .route("/api/user/classification-settings", web::post().to(save_classification_settings))
        .route("/api/sync-preferences", web::post().to(sync_preferences))
        // System
        .route("/api/waitlist", web::post().to(join_waitlist))
        .route("/api/health", web::get().to(health))
        .route("/api/task-status", web::get().to(get_task_status));
}
