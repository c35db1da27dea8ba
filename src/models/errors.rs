use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::gmail::GmailError;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Gmail account not connected")]
    GmailNotConnected,
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailError),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::ValidationError(_) => "INVALID_REQUEST",
            ServiceError::GmailNotConnected => "GMAIL_NOT_CONNECTED",
            ServiceError::AuthenticationError(_) => "UNAUTHORIZED",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Gmail(e) => e.code(),
            ServiceError::Llm(_) => "LLM_ERROR",
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ValidationError(_) | ServiceError::GmailNotConnected => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Gmail(e) => match e.status() {
                Some(401) => StatusCode::UNAUTHORIZED,
                Some(404) => StatusCode::NOT_FOUND,
                Some(429) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            ServiceError::Llm(_) => StatusCode::BAD_GATEWAY,
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred".to_string()
            }
            ServiceError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            ServiceError::ValidationError(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::AuthenticationError(msg)
            | ServiceError::Conflict(msg) => msg.clone(),
            ServiceError::Gmail(e) => {
                tracing::warn!("Gmail API error: {}", e);
                e.to_string()
            }
            ServiceError::Llm(e) => {
                tracing::warn!("LLM error: {}", e);
                e.to_string()
            }
            ServiceError::GmailNotConnected => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message,
            "code": self.code()
        }))
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(err.to_string())
    }
}
