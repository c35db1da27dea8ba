use actix_web::{web, HttpResponse, Result};
use utoipa;

use crate::models::{ApiResponse, LoginForm, RegisterForm, ServiceError};
use crate::services::AccountService;

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterForm,
    responses(
        (status = 201, description = "Account created", body = ApiResponse),
        (status = 400, description = "Invalid username or password", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    ),
    security()
)]
pub async fn register_api(
    account_service: web::Data<AccountService>,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.into_inner();
    let user = account_service.register(form.username, form.password).await?;

    Ok(HttpResponse::Created().json(ApiResponse {
        success: true,
        message: format!("User {} registered successfully", user.username),
    }))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Login successful - JWT token returned in response body", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    security()
)]
pub async fn login_api(
    account_service: web::Data<AccountService>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, ServiceError> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(ServiceError::ValidationError(
            "Username and password are required".to_string(),
        ));
    }

    let response = account_service.login(&form.username, &form.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logout successful", body = ApiResponse)
    ),
    security()
)]
pub async fn logout_api() -> Result<HttpResponse, ServiceError> {
    // With JWT, logout is handled client-side by discarding the token
    Ok(HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: "Logout successful - discard your token".to_string(),
    }))
}
