use actix_web::{web, HttpResponse, Result};
use serde_json;
use utoipa;

use crate::auth::JwtManager;
use crate::middleware::auth::authenticate_request;
use crate::models::{HealthResponse, ServiceError, TaskStatusData, TaskStatusResponse, WaitlistForm};
use crate::scheduler::BackgroundScheduler;
use crate::services::WaitlistService;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    security()
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/task-status",
    responses(
        (status = 200, description = "Background task status retrieved", body = TaskStatusResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_task_status(
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
    scheduler: web::Data<BackgroundScheduler>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    authenticate_request(&req, &jwt_manager)?;

    Ok(HttpResponse::Ok().json(TaskStatusResponse {
        success: true,
        status: TaskStatusData {
            running: scheduler.is_running().await,
            interval_secs: scheduler.interval_secs(),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/waitlist",
    request_body = WaitlistForm,
    responses(
        (status = 201, description = "Joined the waitlist"),
        (status = 400, description = "Invalid email address", body = ErrorResponse),
        (status = 409, description = "Already on the waitlist", body = ErrorResponse)
    ),
    security()
)]
pub async fn join_waitlist(
    waitlist_service: web::Data<WaitlistService>,
    form: web::Json<WaitlistForm>,
) -> Result<HttpResponse, ServiceError> {
    waitlist_service.join(form.email.as_deref()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Successfully joined the waitlist!"
    })))
}
