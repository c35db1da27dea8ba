use std::collections::BTreeMap;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    ApiResponse, AuthUrlResponse, Category, ClassificationData, ClassificationSettingsForm,
    ClassificationSettingsResponse, ClassifiedEmailData, ClassifyContentBatchRequest,
    ClassifyEmailRequest, ClassifyEmailResponse, ConnectionError, ConnectionResponse,
    ConnectionStats, ContentBatchInput, ContentBatchItem, EmailContentInput, EmailContentResponse,
    EmailListResponse, EmailSummary, ErrorResponse, FreshlyClassifiedEmail, HealthResponse,
    ImportantEmail, ImportantEmailsResponse, LabelColorData, LabelData, LabelsResponse,
    LoginForm, LoginResponse, OAuthCallbackBody, PreferencesData, PreferencesForm,
    PreferencesUpdateResponse, ProcessingFrequency, RecentEmail, RecentEmailsResponse,
    RegisterForm, StoredBatchItem, SyncPreferencesResponse, SyncResponse, TaskStatusData,
    TaskStatusResponse, WaitlistForm,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inbox Triage API",
        description = "Gmail triage into ATTN, FK-U, MARKETING, TAKE-A-LOOK and HMMMM buckets"
    ),
    paths(
        handlers::auth::register_api,
        handlers::auth::login_api,
        handlers::auth::logout_api,
        handlers::oauth::gmail_auth_url,
        handlers::oauth::gmail_oauth_redirect,
        handlers::oauth::gmail_oauth_callback,
        handlers::gmail::gmail_connection,
        handlers::gmail::list_emails,
        handlers::gmail::sync_emails,
        handlers::gmail::today_emails,
        handlers::gmail::email_content,
        handlers::gmail::labels,
        handlers::gmail::recent_emails,
        handlers::gmail::important_emails,
        handlers::classification::classify_email,
        handlers::classification::classify_stored,
        handlers::classification::classify_batch,
        handlers::classification::classified_view,
        handlers::preferences::get_preferences,
        handlers::preferences::save_preferences,
        handlers::preferences::get_classification_settings,
        handlers::preferences::save_classification_settings,
        handlers::preferences::sync_preferences,
        handlers::system::health,
        handlers::system::get_task_status,
        handlers::system::join_waitlist,
    ),
    components(schemas(
        ApiResponse, ErrorResponse, LoginForm, RegisterForm, LoginResponse, AuthUrlResponse,
        OAuthCallbackBody, ConnectionResponse, ConnectionStats, ConnectionError, EmailSummary,
        EmailListResponse, SyncResponse, EmailContentResponse, RecentEmail, RecentEmailsResponse,
        ImportantEmail, ImportantEmailsResponse, LabelData, LabelColorData, LabelsResponse,
        Category, ClassifyEmailRequest, ClassifyEmailResponse, StoredBatchItem,
        EmailContentInput, ClassifyContentBatchRequest, ContentBatchInput, ContentBatchItem,
        ClassificationData, FreshlyClassifiedEmail, ClassifiedEmailData, ProcessingFrequency,
        PreferencesForm, PreferencesData, PreferencesUpdateResponse, ClassificationSettingsForm,
        ClassificationSettingsResponse, SyncPreferencesResponse, WaitlistForm, HealthResponse,
        TaskStatusData, TaskStatusResponse,
    )),
    tags(
        (name = "inbox-triage", description = "Gmail triage endpoints")
    )
)]
pub struct ApiDoc;

pub fn configure_openapi(mut openapi: OpenApiSpec) -> OpenApiSpec {
    // Add Bearer token security scheme (HTTP Bearer type, not ApiKey)
    let mut security_schemes = BTreeMap::new();
    security_schemes.insert(
        "bearer_auth".to_string(),
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some("JWT token from /api/login"))
                .build(),
        ),
    );

    if let Some(components) = openapi.components.as_mut() {
        components.security_schemes = security_schemes;
    }

    // Applies to all endpoints except those with a security() override
    openapi.security = Some(vec![SecurityRequirement::new(
        "bearer_auth",
        Vec::<String>::new(),
    )]);

    openapi
}
