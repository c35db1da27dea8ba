use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;

pub const DEFAULT_GOOGLE_REDIRECT_URL: &str = "http://localhost:5000/api/auth/callback/google-gmail";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub jwt_secret: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_url: String,
    /// Front-end base URL used for post-OAuth redirects
    pub app_url: String,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub scheduler_enabled: bool,
    pub scheduler_interval_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn bind_address(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))
}

fn random_secret() -> String {
    use base64::Engine;
    use rand::Rng;

    let bytes: [u8; 32] = rand::thread_rng().gen();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env_or("HOST", "0.0.0.0");
        let port = env_parse::<u16>("PORT", 5000);

        let bind_address = bind_address(&host, port)?;

        let database_url = env_or("DATABASE_URL", "sqlite:triage.db?mode=rwc");

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using a random secret; sessions will not survive a restart");
            random_secret()
        });

        let llm_api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            database_url,
            bind_address,
            jwt_secret,
            google_client_id: env_or("GOOGLE_CLIENT_ID", ""),
            google_client_secret: env_or("GOOGLE_CLIENT_SECRET", ""),
            google_redirect_url: env_or("GOOGLE_REDIRECT_URL", DEFAULT_GOOGLE_REDIRECT_URL),
            app_url: env_or("APP_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_api_key,
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            scheduler_enabled: env_flag("SCHEDULER_ENABLED", true),
            scheduler_interval_secs: env_parse("SCHEDULER_INTERVAL_SECS", 300),
        })
    }
}
