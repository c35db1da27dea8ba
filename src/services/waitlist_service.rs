use std::sync::Arc;

use crate::models::{ServiceError, WaitlistEntry};
use crate::repositories::WaitlistRepository;

pub struct WaitlistService {
    repository: Arc<dyn WaitlistRepository>,
}

impl WaitlistService {
    pub fn new(repository: Arc<dyn WaitlistRepository>) -> Self {
        Self { repository }
    }

    pub async fn join(&self, email: Option<&str>) -> Result<WaitlistEntry, ServiceError> {
        let email = email
            .map(str::trim)
            .filter(|e| validator::validate_email(*e))
            .ok_or_else(|| ServiceError::ValidationError("Invalid email address provided.".to_string()))?;

        let entry = self.repository.add(email).await?;
        tracing::info!("Waitlist signup: {}", entry.email);
        Ok(entry)
    }
}
