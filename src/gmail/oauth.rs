//! Google OAuth 2.0 authorization-code flow for the read-only Gmail scope.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::GmailError;

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Tokens returned by a code exchange or refresh
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    /// Google only returns a refresh token on the first consent.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn authorization_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, GmailError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, GmailError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleOAuthClient {
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
        }
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenSet, GmailError> {
        let response = self.http.post(GOOGLE_TOKEN_URL).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GmailError::Api { status, message });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| GmailError::Decode(format!("token response: {}", e)))?;

        Ok(tokens.into())
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(GMAIL_READONLY_SCOPE),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, GmailError> {
        self.token_request(&[
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, GmailError> {
        self.token_request(&[
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_requests_offline_readonly_access() {
        let client = GoogleOAuthClient::new(
            reqwest::Client::new(),
            "client-123",
            "secret",
            "http://localhost:5000/api/auth/callback/google-gmail",
        );
        let url = client.authorization_url("a.b/c");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fcallback%2Fgoogle-gmail"
        ));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.readonly"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=a.b%2Fc"));
    }

    #[test]
    fn token_response_defaults_expiry() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"at","token_type":"Bearer"}"#).unwrap();
        let tokens = TokenSet::from(response);

        assert_eq!(tokens.access_token, "at");
        assert!(tokens.refresh_token.is_none());
        let remaining = tokens.expires_at - Utc::now();
        assert!(remaining > Duration::seconds(3500) && remaining <= Duration::seconds(3600));
    }
}
