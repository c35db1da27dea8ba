use actix_web::{web, HttpResponse, Result};
use utoipa;

use crate::auth::JwtManager;
use crate::middleware::auth::authenticate_request;
use crate::models::{
    ImportantEmailsResponse, LabelsResponse, ListEmailsQuery, ListOptions, RecentEmailsResponse,
    ServiceError,
};
use crate::services::{ClassificationService, GmailService};

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 500;

impl From<ListEmailsQuery> for ListOptions {
    fn from(query: ListEmailsQuery) -> Self {
        Self {
            max_results: query
                .max_results
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            page_token: query.page_token.filter(|t| !t.is_empty()),
            label_ids: query
                .label_ids
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            q: query.q.filter(|q| !q.is_empty()),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/gmail/connection",
    responses(
        (status = 200, description = "Connection state; a rejected grant is cleared and reported here", body = ConnectionResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn gmail_connection(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let status = gmail_service.connection_status(user_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[utoipa::path(
    get,
    path = "/api/gmail/emails",
    params(
        ("maxResults" = Option<u32>, Query, description = "Page size, default 50"),
        ("pageToken" = Option<String>, Query, description = "Continuation token"),
        ("labelIds" = Option<String>, Query, description = "Comma-separated label ids"),
        ("q" = Option<String>, Query, description = "Gmail search query")
    ),
    responses(
        (status = 200, description = "One page of messages", body = EmailListResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_emails(
    gmail_service: web::Data<GmailService>,
    query: web::Query<ListEmailsQuery>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let options = ListOptions::from(query.into_inner());
    let page = gmail_service.list_emails(user_id, &options).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/gmail/emails",
    responses(
        (status = 200, description = "Newest messages stored", body = SyncResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn sync_emails(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let result = gmail_service.sync(user_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    get,
    path = "/api/gmail/today",
    responses(
        (status = 200, description = "Messages received since local midnight", body = EmailListResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn today_emails(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let page = gmail_service.today(user_id).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/gmail/emails/{id}/content",
    params(
        ("id" = String, Path, description = "Gmail message id")
    ),
    responses(
        (status = 200, description = "Message body for display", body = EmailContentResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    )
)]
pub async fn email_content(
    gmail_service: web::Data<GmailService>,
    path: web::Path<String>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let email_id = path.into_inner();
    let content = gmail_service.email_content(user_id, &email_id).await?;
    Ok(HttpResponse::Ok().json(content))
}

#[utoipa::path(
    get,
    path = "/api/gmail/labels",
    responses(
        (status = 200, description = "Labels mirrored from Gmail", body = LabelsResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse)
    )
)]
pub async fn labels(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let labels = gmail_service.labels(user_id).await?;
    Ok(HttpResponse::Ok().json(LabelsResponse { labels }))
}

#[utoipa::path(
    get,
    path = "/api/gmail/recent",
    responses(
        (status = 200, description = "Newest messages with cleaned bodies", body = RecentEmailsResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse)
    )
)]
pub async fn recent_emails(
    gmail_service: web::Data<GmailService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let emails = gmail_service.recent(user_id).await?;
    Ok(HttpResponse::Ok().json(RecentEmailsResponse { emails }))
}

#[utoipa::path(
    get,
    path = "/api/gmail/important",
    responses(
        (status = 200, description = "Messages the model considers most important", body = ImportantEmailsResponse),
        (status = 400, description = "Gmail not connected", body = ErrorResponse),
        (status = 502, description = "Model call failed", body = ErrorResponse)
    )
)]
pub async fn important_emails(
    classification_service: web::Data<ClassificationService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let emails = classification_service.important(user_id).await?;
    Ok(HttpResponse::Ok().json(ImportantEmailsResponse { emails }))
}
