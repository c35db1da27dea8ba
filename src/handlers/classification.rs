use actix_web::{web, HttpResponse, Result};
use serde_json;
use utoipa;

use crate::auth::JwtManager;
use crate::middleware::auth::authenticate_request;
use crate::models::{
    ClassifiedViewQuery, ClassifyContentBatchRequest, ClassifyEmailRequest, ClassifyStoredQuery,
    ServiceError,
};
use crate::services::{ClassificationService, DEFAULT_BATCH_SIZE};

#[utoipa::path(
    post,
    path = "/api/gmail/emails/classify",
    request_body = ClassifyEmailRequest,
    responses(
        (status = 200, description = "Email classified", body = ClassifyEmailResponse),
        (status = 400, description = "Missing email id or Gmail not connected", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn classify_email(
    classification_service: web::Data<ClassificationService>,
    body: web::Json<ClassifyEmailRequest>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let Some(email_id) = body.email_id.as_deref().filter(|id| !id.is_empty()) else {
        return Err(ServiceError::ValidationError("Email ID is required".to_string()));
    };

    let result = classification_service.classify_email(user_id, email_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    get,
    path = "/api/gmail/emails/classify",
    params(
        ("batchSize" = Option<i64>, Query, description = "Emails to classify, default 10"),
        ("onlyNew" = Option<String>, Query, description = "`true` to classify only emails without a category")
    ),
    responses(
        (status = 200, description = "Per-email outcomes with processed/successful/failed counts"),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn classify_stored(
    classification_service: web::Data<ClassificationService>,
    query: web::Query<ClassifyStoredQuery>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let batch_size = query.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
    let only_new = query.only_new();

    match classification_service
        .classify_stored(user_id, batch_size, only_new)
        .await?
    {
        Some(batch) => Ok(HttpResponse::Ok().json(batch)),
        None => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "No emails to classify"
        }))),
    }
}

#[utoipa::path(
    post,
    path = "/api/gmail/emails/classify/batch",
    request_body = ClassifyContentBatchRequest,
    responses(
        (status = 200, description = "Per-email outcomes with processed/successful/failed counts"),
        (status = 400, description = "Missing or empty email array", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn classify_batch(
    classification_service: web::Data<ClassificationService>,
    body: web::Json<ClassifyContentBatchRequest>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let emails = body.into_inner().emails.unwrap_or_default();
    let batch = classification_service.classify_provided(user_id, emails).await?;
    Ok(HttpResponse::Ok().json(batch))
}

#[utoipa::path(
    get,
    path = "/api/gmail/classify",
    params(
        ("mode" = Option<String>, Query, description = "`fetch` classifies recent mail first")
    ),
    responses(
        (status = 200, description = "Classified emails, newest first"),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 502, description = "Model call failed", body = ErrorResponse)
    )
)]
pub async fn classified_view(
    classification_service: web::Data<ClassificationService>,
    query: web::Query<ClassifiedViewQuery>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    if query.mode.as_deref() == Some("fetch") {
        let emails = classification_service.classify_recent(user_id).await?;
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "emails": emails })));
    }

    let emails = classification_service.classified_emails(user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "emails": emails })))
}
