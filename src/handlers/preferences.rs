use actix_web::{web, HttpResponse, Result};
use utoipa;

use crate::auth::JwtManager;
use crate::middleware::auth::authenticate_request;
use crate::models::{
    ApiResponse, ClassificationSettingsForm, ClassificationSettingsResponse, PreferencesForm,
    PreferencesUpdateResponse, ServiceError,
};
use crate::services::PreferenceService;

#[utoipa::path(
    get,
    path = "/api/preferences",
    responses(
        (status = 200, description = "Stored preferences, or defaults", body = PreferencesData),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_preferences(
    preference_service: web::Data<PreferenceService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let preferences = preference_service.get(user_id).await?;
    Ok(HttpResponse::Ok().json(preferences))
}

#[utoipa::path(
    post,
    path = "/api/preferences",
    request_body = PreferencesForm,
    responses(
        (status = 200, description = "Preferences saved", body = PreferencesUpdateResponse),
        (status = 400, description = "Unknown processing frequency", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn save_preferences(
    preference_service: web::Data<PreferenceService>,
    form: web::Json<PreferencesForm>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let preferences = preference_service.save(user_id, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PreferencesUpdateResponse {
        message: "Preferences updated successfully".to_string(),
        preferences,
    }))
}

#[utoipa::path(
    get,
    path = "/api/user/classification-settings",
    responses(
        (status = 200, description = "Custom classification prompt, if any", body = ClassificationSettingsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_classification_settings(
    preference_service: web::Data<PreferenceService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let classification_prompt = preference_service.classification_prompt(user_id).await?;
    Ok(HttpResponse::Ok().json(ClassificationSettingsResponse {
        classification_prompt,
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/classification-settings",
    request_body = ClassificationSettingsForm,
    responses(
        (status = 200, description = "Prompt saved", body = ApiResponse),
        (status = 400, description = "Prompt is not a string", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn save_classification_settings(
    preference_service: web::Data<PreferenceService>,
    form: web::Json<ClassificationSettingsForm>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    preference_service
        .set_classification_prompt(user_id, form.into_inner().classification_prompt)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: "Classification settings saved".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/sync-preferences",
    responses(
        (status = 200, description = "Custom prompt as stored in preferences", body = SyncPreferencesResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn sync_preferences(
    preference_service: web::Data<PreferenceService>,
    req: actix_web::HttpRequest,
    jwt_manager: web::Data<JwtManager>,
) -> Result<HttpResponse, ServiceError> {
    // Authentication
    let user_id = authenticate_request(&req, &jwt_manager)?;

    let result = preference_service.sync(user_id).await?;
    Ok(HttpResponse::Ok().json(result))
}
