use chrono::{DateTime, Utc};

/// Database entity representing an application account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub gmail_address: Option<String>,
    pub gmail_access_token: Option<String>,
    pub gmail_refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Stored OAuth grant, present only when all three token fields are set.
    pub fn gmail_credentials(&self) -> Option<GmailCredentials> {
        match (
            &self.gmail_access_token,
            &self.gmail_refresh_token,
            self.token_expires_at,
        ) {
            (Some(access_token), Some(refresh_token), Some(expires_at)) => Some(GmailCredentials {
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
                expires_at,
            }),
            _ => None,
        }
    }

    pub fn is_gmail_connected(&self) -> bool {
        self.gmail_credentials().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Business model for account registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl Registration {
    pub fn new(username: String, password: String) -> Result<Self, String> {
        let username = username.trim().to_string();
        if username.len() < 3 || username.len() > 64 {
            return Err("Username must be between 3 and 64 characters".to_string());
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
        {
            return Err("Username contains invalid characters".to_string());
        }
        if password.len() < 8 {
            return Err("Password must be at least 8 characters long".to_string());
        }

        Ok(Self { username, password })
    }
}
