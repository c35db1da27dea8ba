use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

use crate::auth::{JwtManager, SESSION_TTL_HOURS};
use crate::models::{LoginResponse, Registration, ServiceError, User};
use crate::repositories::UserRepository;

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    jwt_manager: JwtManager,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_manager: JwtManager) -> Self {
        Self { users, jwt_manager }
    }

    pub async fn register(&self, username: String, password: String) -> Result<User, ServiceError> {
        let registration =
            Registration::new(username, password).map_err(ServiceError::ValidationError)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(registration.password.as_bytes(), &salt)
            .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {}", e)))?
            .to_string();

        let user = self
            .users
            .create(&registration.username, &password_hash)
            .await?;

        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let invalid = || ServiceError::AuthenticationError("Invalid credentials".to_string());

        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| invalid())?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| invalid())?;

        let token = self
            .jwt_manager
            .generate_token(user.id, &user.username)
            .map_err(|_| ServiceError::InternalError("Failed to generate token".to_string()))?;

        Ok(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            expires_in: (SESSION_TTL_HOURS * 3600) as u64,
        })
    }
}
