use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Database entity; list fields are JSON-encoded string arrays
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    pub custom_prompt: Option<String>,
    pub priority_senders: Option<String>,
    pub ignored_senders: Option<String>,
    pub content_keywords: Option<String>,
    pub processing_frequency: String,
    pub processing_schedule: Option<String>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreference {
    pub fn frequency(&self) -> ProcessingFrequency {
        self.processing_frequency.parse().unwrap_or_default()
    }

    /// Custom prompt, treating a blank string as unset.
    pub fn prompt(&self) -> Option<&str> {
        self.custom_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    pub fn priority_senders(&self) -> Vec<String> {
        decode_list(self.priority_senders.as_deref())
    }

    pub fn ignored_senders(&self) -> Vec<String> {
        decode_list(self.ignored_senders.as_deref())
    }

    pub fn content_keywords(&self) -> Vec<String> {
        decode_list(self.content_keywords.as_deref())
    }
}

fn decode_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingFrequency {
    #[default]
    Hourly,
    Daily,
    Weekly,
    Manual,
}

impl ProcessingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingFrequency::Hourly => "HOURLY",
            ProcessingFrequency::Daily => "DAILY",
            ProcessingFrequency::Weekly => "WEEKLY",
            ProcessingFrequency::Manual => "MANUAL",
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            ProcessingFrequency::Hourly => Some(Duration::hours(1)),
            ProcessingFrequency::Daily => Some(Duration::days(1)),
            ProcessingFrequency::Weekly => Some(Duration::weeks(1)),
            ProcessingFrequency::Manual => None,
        }
    }

    /// Whether background processing should run now given the last run.
    pub fn is_due(&self, last_processed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match (self.interval(), last_processed_at) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(interval), Some(last)) => now - last >= interval,
        }
    }
}

impl fmt::Display for ProcessingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOURLY" => Ok(ProcessingFrequency::Hourly),
            "DAILY" => Ok(ProcessingFrequency::Daily),
            "WEEKLY" => Ok(ProcessingFrequency::Weekly),
            "MANUAL" => Ok(ProcessingFrequency::Manual),
            other => Err(format!("Unknown processing frequency: {}", other)),
        }
    }
}

/// Validated preference write
#[derive(Debug, Clone, Default)]
pub struct PreferenceUpdate {
    pub custom_prompt: Option<String>,
    pub priority_senders: Option<Vec<String>>,
    pub ignored_senders: Option<Vec<String>>,
    pub content_keywords: Option<Vec<String>>,
    pub processing_frequency: ProcessingFrequency,
    pub processing_schedule: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parsing_is_case_insensitive() {
        assert_eq!("daily".parse(), Ok(ProcessingFrequency::Daily));
        assert_eq!(" WEEKLY ".parse(), Ok(ProcessingFrequency::Weekly));
        assert!("FORTNIGHTLY".parse::<ProcessingFrequency>().is_err());
    }

    #[test]
    fn due_checks_follow_interval() {
        let now = Utc::now();
        let hourly = ProcessingFrequency::Hourly;

        assert!(hourly.is_due(None, now));
        assert!(!hourly.is_due(Some(now - Duration::minutes(30)), now));
        assert!(hourly.is_due(Some(now - Duration::minutes(61)), now));
        assert!(!ProcessingFrequency::Daily.is_due(Some(now - Duration::hours(23)), now));
        assert!(!ProcessingFrequency::Manual.is_due(None, now));
    }

    #[test]
    fn list_fields_tolerate_bad_json() {
        let pref = UserPreference {
            id: 1,
            user_id: 1,
            custom_prompt: Some("   ".to_string()),
            priority_senders: Some(r#"["boss@example.com"]"#.to_string()),
            ignored_senders: Some("not json".to_string()),
            content_keywords: None,
            processing_frequency: "bogus".to_string(),
            processing_schedule: None,
            last_processed_at: None,
            updated_at: Utc::now(),
        };

        assert_eq!(pref.priority_senders(), vec!["boss@example.com".to_string()]);
        assert!(pref.ignored_senders().is_empty());
        assert!(pref.content_keywords().is_empty());
        assert_eq!(pref.frequency(), ProcessingFrequency::Hourly);
        assert_eq!(pref.prompt(), None);
    }
}
