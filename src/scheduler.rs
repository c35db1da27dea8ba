use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::models::{ProcessingFrequency, ServiceError, User};
use crate::repositories::{PreferenceRepository, UserRepository};
use crate::services::{ClassificationService, GmailService};

/// Stored emails classified per user on each background pass
pub const CLASSIFY_PER_RUN: i64 = 10;

/// One background pass over every Gmail-connected user.
#[derive(Clone)]
pub struct ProcessingJob {
    users: Arc<dyn UserRepository>,
    preferences: Arc<dyn PreferenceRepository>,
    gmail: Arc<GmailService>,
    classification: Arc<ClassificationService>,
}

impl ProcessingJob {
    pub fn new(
        users: Arc<dyn UserRepository>,
        preferences: Arc<dyn PreferenceRepository>,
        gmail: Arc<GmailService>,
        classification: Arc<ClassificationService>,
    ) -> Self {
        Self {
            users,
            preferences,
            gmail,
            classification,
        }
    }

    /// Processes every user whose frequency is due. Returns how many users ran.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        let users = self.users.find_gmail_connected().await?;
        let mut processed = 0;

        for user in users {
            let preference = self.preferences.find_by_user(user.id).await?;
            let due = match &preference {
                Some(pref) => pref.frequency().is_due(pref.last_processed_at, now),
                None => ProcessingFrequency::default().is_due(None, now),
            };
            if !due {
                continue;
            }

            match self.process_user(&user, now).await {
                Ok(classified) => {
                    processed += 1;
                    tracing::info!(
                        "Background processing done for {}: {} emails classified",
                        user.username,
                        classified
                    );
                }
                Err(e) => {
                    tracing::error!("Background processing failed for {}: {}", user.username, e);
                }
            }
        }

        Ok(processed)
    }

    async fn process_user(&self, user: &User, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        self.gmail.sync(user.id).await?;
        let classified = self
            .classification
            .classify_pending(user.id, CLASSIFY_PER_RUN)
            .await?;
        self.preferences.mark_processed(user.id, now).await?;
        Ok(classified)
    }
}

pub struct BackgroundScheduler {
    job: ProcessingJob,
    interval_secs: u64,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl BackgroundScheduler {
    pub fn new(job: ProcessingJob, interval_secs: u64) -> Self {
        Self {
            job,
            interval_secs: interval_secs.max(1),
            running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            tracing::warn!("Background scheduler is already running");
            return;
        }
        *running = true;

        let job = self.job.clone();
        let running_flag = Arc::clone(&self.running);
        let period = Duration::from_secs(self.interval_secs);

        tokio::spawn(async move {
            tracing::info!("Background scheduler started, every {}s", period.as_secs());
            let mut interval = interval(period);

            loop {
                interval.tick().await;

                // Check if we should still be running
                {
                    let running = running_flag.read().await;
                    if !*running {
                        tracing::info!("Background scheduler stopped");
                        break;
                    }
                }

                if let Err(e) = job.run(Utc::now()).await {
                    tracing::error!("Background processing pass failed: {}", e);
                }
            }
        });
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        tracing::info!("Background scheduler stop requested");
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}
