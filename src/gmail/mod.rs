pub mod client;
pub mod content;
pub mod error;
pub mod oauth;
pub mod rate_limit;

pub use client::{
    parse_email_metadata, GmailClient, GmailConnector, GoogleGmailConnector, MailboxProvider,
};
pub use error::GmailError;
pub use oauth::{GoogleOAuthClient, OAuthProvider, TokenSet};
pub use rate_limit::{RateLimiter, RetryPolicy};
