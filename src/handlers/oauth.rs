use actix_web::http::header;
use actix_web::{web, HttpResponse, Result};
use utoipa;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::middleware::auth::authenticate_request;
use crate::models::{
    ApiResponse, AuthUrlResponse, OAuthCallbackBody, OAuthCallbackQuery, ServiceError,
};
use crate::services::GmailService;

/// Empty strings count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[utoipa::path(
    get,
    path = "/api/auth/google-gmail",
    responses(
        (status = 200, description = "Google consent URL for the read-only Gmail scope", body = AuthUrlResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn gmail_auth_url(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let auth_url = gmail_service.authorization_url(user_id)?;
    Ok(HttpResponse::Ok().json(AuthUrlResponse {
        success: true,
        auth_url,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/callback/google-gmail",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "State token issued with the consent URL"),
        ("error" = Option<String>, Query, description = "Error reported by Google")
    ),
    responses(
        (status = 302, description = "Redirect to the dashboard with the outcome in the query string")
    ),
    security()
)]
pub async fn gmail_oauth_redirect(
    gmail_service: web::Data<GmailService>,
    config: web::Data<AppConfig>,
    query: web::Query<OAuthCallbackQuery>,
) -> HttpResponse {
    let dashboard = format!("{}/dashboard", config.app_url);

    if let Some(error) = &query.error {
        tracing::warn!("Google OAuth error: {}", error);
        return redirect(format!("{}?error=google_auth_failed", dashboard));
    }

    let (Some(code), Some(state)) = (present(&query.code), present(&query.state)) else {
        return redirect(format!("{}?error=invalid_oauth_response", dashboard));
    };

    match gmail_service.complete_authorization(code, state).await {
        Ok(_) => redirect(format!("{}?gmail=connected", dashboard)),
        Err(e) => {
            tracing::error!("Error handling Google OAuth callback: {}", e);
            redirect(format!("{}?error=google_auth_failed", dashboard))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/google-gmail/callback",
    request_body = OAuthCallbackBody,
    responses(
        (status = 200, description = "Gmail connected", body = ApiResponse),
        (status = 400, description = "Missing or invalid code or state", body = ErrorResponse)
    ),
    security()
)]
pub async fn gmail_oauth_callback(
    gmail_service: web::Data<GmailService>,
    body: web::Json<OAuthCallbackBody>,
) -> Result<HttpResponse, ServiceError> {
    let (Some(code), Some(state)) = (present(&body.code), present(&body.state)) else {
        return Err(ServiceError::ValidationError(
            "Missing code or state".to_string(),
        ));
    };

    gmail_service
        .complete_authorization(code, state)
        .await
        .map_err(|e| match e {
            ServiceError::Gmail(e) => {
                ServiceError::ValidationError(format!("Failed to exchange code: {}", e))
            }
            other => other,
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: "Gmail connected".to_string(),
    }))
}
