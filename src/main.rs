use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use inbox_triage::auth::JwtManager;
use inbox_triage::config::AppConfig;
use inbox_triage::gmail::{GmailConnector, GoogleGmailConnector, GoogleOAuthClient, OAuthProvider};
use inbox_triage::handlers;
use inbox_triage::llm::{ChatCompletion, Classifier, OpenAiCompatibleClient};
use inbox_triage::openapi_config::{configure_openapi, ApiDoc};
use inbox_triage::repositories::{
    SqliteClassificationRepository, SqliteEmailRepository, SqliteLabelRepository,
    SqlitePreferenceRepository, SqliteStatsRepository, SqliteUserRepository,
    SqliteWaitlistRepository,
};
use inbox_triage::scheduler::{BackgroundScheduler, ProcessingJob};
use inbox_triage::services::{
    AccountService, ClassificationService, GmailService, PreferenceService, WaitlistService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Initialize database
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize repositories
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let email_repository = Arc::new(SqliteEmailRepository::new(pool.clone()));
    let label_repository = Arc::new(SqliteLabelRepository::new(pool.clone()));
    let preference_repository = Arc::new(SqlitePreferenceRepository::new(pool.clone()));
    let classification_repository = Arc::new(SqliteClassificationRepository::new(pool.clone()));
    let stats_repository = Arc::new(SqliteStatsRepository::new(pool.clone()));
    let waitlist_repository = Arc::new(SqliteWaitlistRepository::new(pool.clone()));

    // External APIs
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?;
    let oauth: Arc<dyn OAuthProvider> = Arc::new(GoogleOAuthClient::new(
        http.clone(),
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_url.clone(),
    ));
    let connector: Arc<dyn GmailConnector> = Arc::new(GoogleGmailConnector::new(
        http.clone(),
        oauth.clone(),
        user_repository.clone(),
    ));
    if config.llm_api_key.is_none() {
        tracing::warn!("LLM_API_KEY not set; classification requests will fail");
    }
    let llm: Arc<dyn ChatCompletion> = Arc::new(OpenAiCompatibleClient::new(
        http,
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));

    let jwt_manager = JwtManager::new(&config.jwt_secret);

    // Initialize services with dependency injection
    let gmail_service = Arc::new(GmailService::new(
        user_repository.clone(),
        email_repository.clone(),
        label_repository,
        stats_repository,
        connector,
        oauth,
        jwt_manager.clone(),
    ));
    let classification_service = Arc::new(ClassificationService::new(
        gmail_service.clone(),
        email_repository,
        classification_repository,
        preference_repository.clone(),
        Classifier::new(llm),
    ));
    let account_service = web::Data::new(AccountService::new(
        user_repository.clone(),
        jwt_manager.clone(),
    ));
    let preference_service = web::Data::new(PreferenceService::new(preference_repository.clone()));
    let waitlist_service = web::Data::new(WaitlistService::new(waitlist_repository));

    // Initialize and start background scheduler
    let scheduler = Arc::new(BackgroundScheduler::new(
        ProcessingJob::new(
            user_repository,
            preference_repository,
            gmail_service.clone(),
            classification_service.clone(),
        ),
        config.scheduler_interval_secs,
    ));
    if config.scheduler_enabled {
        scheduler.start().await;
    }

    let jwt_manager = web::Data::new(jwt_manager);
    let app_config = web::Data::new(config.clone());

    tracing::info!("Inbox triage server listening on http://{}", config.bind_address);
    tracing::info!("API documentation: http://{}/swagger-ui/", config.bind_address);

    // Configure OpenAPI spec with Bearer auth (do this once, outside the closure)
    let openapi_spec = configure_openapi(ApiDoc::openapi());

    HttpServer::new(move || {
        App::new()
            .app_data(jwt_manager.clone())
            .app_data(app_config.clone())
            .app_data(web::Data::from(scheduler.clone()))
            .app_data(web::Data::from(gmail_service.clone()))
            .app_data(web::Data::from(classification_service.clone()))
            .app_data(account_service.clone())
            .app_data(preference_service.clone())
            .app_data(waitlist_service.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials(),
            )
            .wrap(Logger::default())
            // Swagger UI for API documentation
            .service(
                utoipa_swagger_ui::SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi_spec.clone()),
            )
            .configure(handlers::configure_routes)
    })
    .bind(config.bind_address)?
    .run()
    .await?;

    Ok(())
}
