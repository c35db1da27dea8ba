use actix_web::HttpRequest;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::models::ServiceError;

pub const SESSION_TTL_HOURS: i64 = 24;
pub const STATE_TTL_MINUTES: i64 = 10;
const GMAIL_OAUTH_PURPOSE: &str = "gmail_oauth";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    #[serde(default)]
    pub username: String,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued at
    /// Set only on single-purpose tokens such as the OAuth state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    fn sign(
        &self,
        user_id: i64,
        username: &str,
        ttl: Duration,
        purpose: Option<&str>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            purpose: purpose.map(str::to_string),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(user_id, username, Duration::hours(SESSION_TTL_HOURS), None)
    }

    /// Verifies a session token. Purpose-bound tokens are rejected.
    pub fn verify_token(
        &self,
        token: &str,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        if data.claims.purpose.is_some() {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(data)
    }

    /// Short-lived token carried in the OAuth `state` parameter.
    pub fn generate_state_token(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(
            user_id,
            "",
            Duration::minutes(STATE_TTL_MINUTES),
            Some(GMAIL_OAUTH_PURPOSE),
        )
    }

    /// Returns the user id named by a state token.
    pub fn verify_state_token(&self, state: &str) -> Option<i64> {
        let data = decode::<Claims>(state, &self.decoding_key, &Validation::default()).ok()?;
        if data.claims.purpose.as_deref() != Some(GMAIL_OAUTH_PURPOSE) {
            return None;
        }
        data.claims.user_id()
    }
}

pub fn extract_token_from_header(req: &HttpRequest) -> Option<String> {
    let auth_header = req
        .headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;

    // Handle case where token accidentally starts with "bearer " due to Swagger UI bug
    if auth_header.starts_with("bearer ") {
        Some(auth_header.strip_prefix("bearer ")?.to_string())
    } else {
        Some(auth_header.to_string())
    }
}

pub fn verify_jwt(req: &HttpRequest, jwt_manager: &JwtManager) -> Result<Claims, ServiceError> {
    let token = extract_token_from_header(req).ok_or_else(|| {
        ServiceError::AuthenticationError("Missing Authorization header".to_string())
    })?;

    match jwt_manager.verify_token(&token) {
        Ok(token_data) => Ok(token_data.claims),
        Err(_) => Err(ServiceError::AuthenticationError("Invalid token".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn session_token_round_trip() {
        let jwt = JwtManager::new("secret");
        let token = jwt.generate_token(42, "alice").unwrap();
        let claims = jwt.verify_token(&token).unwrap().claims;

        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.username, "alice");
        assert!(claims.purpose.is_none());
    }

    #[test]
    fn session_and_state_tokens_are_not_interchangeable() {
        let jwt = JwtManager::new("secret");
        let session = jwt.generate_token(7, "bob").unwrap();
        let state = jwt.generate_state_token(7).unwrap();

        assert_eq!(jwt.verify_state_token(&state), Some(7));
        assert_eq!(jwt.verify_state_token(&session), None);
        assert!(jwt.verify_token(&state).is_err());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let state = JwtManager::new("one").generate_state_token(1).unwrap();
        assert_eq!(JwtManager::new("two").verify_state_token(&state), None);
        assert_eq!(JwtManager::new("two").verify_state_token("garbage"), None);
    }

    #[test]
    fn bearer_prefix_is_tolerated_twice() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer bearer abc.def"))
            .to_http_request();
        assert_eq!(extract_token_from_header(&req).as_deref(), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Token abc"))
            .to_http_request();
        assert_eq!(extract_token_from_header(&req), None);
    }
}
