use serde_json::Value;
use std::sync::Arc;

use crate::models::{
    PreferenceUpdate, PreferencesData, PreferencesForm, ProcessingFrequency, ServiceError,
    SyncPreferencesResponse, UserPreference,
};
use crate::repositories::PreferenceRepository;

fn to_data(preference: Option<&UserPreference>) -> PreferencesData {
    match preference {
        Some(pref) => PreferencesData {
            custom_prompt: pref.custom_prompt.clone().unwrap_or_default(),
            priority_senders: pref.priority_senders(),
            ignored_senders: pref.ignored_senders(),
            content_keywords: pref.content_keywords(),
            processing_frequency: pref.frequency(),
            processing_schedule: pref
                .processing_schedule
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            last_processed_at: pref.last_processed_at,
        },
        None => PreferencesData {
            custom_prompt: String::new(),
            priority_senders: Vec::new(),
            ignored_senders: Vec::new(),
            content_keywords: Vec::new(),
            processing_frequency: ProcessingFrequency::default(),
            processing_schedule: None,
            last_processed_at: None,
        },
    }
}

pub struct PreferenceService {
    repository: Arc<dyn PreferenceRepository>,
}

impl PreferenceService {
    pub fn new(repository: Arc<dyn PreferenceRepository>) -> Self {
        Self { repository }
    }

    /// Stored preferences, or the defaults when the user has none yet.
    pub async fn get(&self, user_id: i64) -> Result<PreferencesData, ServiceError> {
        let preference = self.repository.find_by_user(user_id).await?;
        Ok(to_data(preference.as_ref()))
    }

    /// Replaces every preference field with the submitted values.
    pub async fn save(&self, user_id: i64, form: PreferencesForm) -> Result<PreferencesData, ServiceError> {
        let processing_frequency = match form.processing_frequency.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                raw.parse().map_err(ServiceError::ValidationError)?
            }
            _ => ProcessingFrequency::default(),
        };

        let update = PreferenceUpdate {
            custom_prompt: form.custom_prompt,
            priority_senders: form.priority_senders,
            ignored_senders: form.ignored_senders,
            content_keywords: form.content_keywords,
            processing_frequency,
            processing_schedule: form.processing_schedule.filter(|v| !v.is_null()),
        };

        let saved = self.repository.upsert(user_id, &update).await?;
        tracing::debug!("Saved preferences for user {}", user_id);
        Ok(to_data(Some(&saved)))
    }

    pub async fn classification_prompt(&self, user_id: i64) -> Result<Option<String>, ServiceError> {
        let preference = self.repository.find_by_user(user_id).await?;
        Ok(preference.and_then(|p| p.custom_prompt))
    }

    /// Accepts only a JSON string.
    pub async fn set_classification_prompt(
        &self,
        user_id: i64,
        prompt: Option<Value>,
    ) -> Result<(), ServiceError> {
        let Some(Value::String(prompt)) = prompt else {
            return Err(ServiceError::ValidationError("Invalid prompt format".to_string()));
        };

        self.repository.set_custom_prompt(user_id, &prompt).await
    }

    pub async fn sync(&self, user_id: i64) -> Result<SyncPreferencesResponse, ServiceError> {
        let response = match self.repository.find_by_user(user_id).await? {
            Some(preference) => SyncPreferencesResponse {
                message: "Preferences synced successfully".to_string(),
                custom_prompt: preference.custom_prompt,
                synced: true,
            },
            None => SyncPreferencesResponse {
                message: "No preferences found to sync".to_string(),
                custom_prompt: None,
                synced: false,
            },
        };
        Ok(response)
    }
}
