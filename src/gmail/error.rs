use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmailError {
    #[error("Gmail API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Gmail request failed: {0}")]
    Transport(String),
    #[error("Failed to refresh token: {0}")]
    TokenRefresh(String),
    #[error("Failed to decode Gmail response: {0}")]
    Decode(String),
}

impl GmailError {
    /// HTTP status reported by Google, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GmailError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GmailError::Api { status: 401, .. } => "UNAUTHORIZED",
            GmailError::Api { status: 404, .. } => "NOT_FOUND",
            GmailError::Api { status: 429, .. } => "RATE_LIMITED",
            GmailError::Api { .. } => "GMAIL_API_ERROR",
            GmailError::Transport(_) => "TRANSPORT_ERROR",
            GmailError::TokenRefresh(_) => "TOKEN_REFRESH_ERROR",
            GmailError::Decode(_) => "DECODE_ERROR",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the stored grant should be considered dead.
    pub fn invalidates_grant(&self) -> bool {
        self.is_unauthorized() || matches!(self, GmailError::TokenRefresh(_))
    }
}

impl From<reqwest::Error> for GmailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GmailError::Decode(err.to_string())
        } else {
            GmailError::Transport(err.to_string())
        }
    }
}
