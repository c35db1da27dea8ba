use crate::auth::{verify_jwt, JwtManager};
use crate::models::ServiceError;

/// Resolves the calling user's id from the bearer token.
pub fn authenticate_request(
    req: &actix_web::HttpRequest,
    jwt_manager: &JwtManager,
) -> Result<i64, ServiceError> {
    let claims = verify_jwt(req, jwt_manager)?;
    claims
        .user_id()
        .ok_or_else(|| ServiceError::AuthenticationError("Invalid token subject".to_string()))
}
