//! Background job scheduler.
//!
//! Requires the `background-jobs` feature to be enabled.
//!
//! # Available Jobs
//!
//! - **Expiration notice sweep**: notifies clients whose licenses fall in a
//!   notice window. Runs daily by default. Running it more than once a day
//!   sends duplicate notices.
//!
//! # Usage
//!
//! ```rust,ignore
//! use license_portal::jobs::{JobConfig, JobScheduler};
//!
//! let scheduler = JobScheduler::new(db, notifier, rules, JobConfig::default()).await?;
//! scheduler.start().await?;
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler as TokioJobScheduler};
use tracing::{error, info};

use crate::config::JobsConfig;
use crate::eligibility::WindowRules;
use crate::notifier::Notifier;
use crate::server::database::Database;

mod notification_sweep;

pub use notification_sweep::run_expiration_notice_sweep;

/// Configuration for background jobs.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Cron expression for the notification sweep (default: daily at 08:00 UTC)
    pub sweep_cron: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            sweep_cron: "0 0 8 * * *".to_string(),
        }
    }
}

impl From<&JobsConfig> for JobConfig {
    fn from(config: &JobsConfig) -> Self {
        Self {
            sweep_cron: config.sweep_cron.clone(),
        }
    }
}

/// Background job scheduler.
pub struct JobScheduler {
    scheduler: TokioJobScheduler,
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    rules: Arc<WindowRules>,
    config: JobConfig,
}

impl JobScheduler {
    /// Create a new job scheduler.
    pub async fn new(
        db: Arc<Database>,
        notifier: Arc<dyn Notifier>,
        rules: Arc<WindowRules>,
        config: JobConfig,
    ) -> Result<Self, JobError> {
        let scheduler = TokioJobScheduler::new()
            .await
            .map_err(|e| JobError::SchedulerError(e.to_string()))?;

        Ok(Self {
            scheduler,
            db,
            notifier,
            rules,
            config,
        })
    }

    /// Start the job scheduler with all configured jobs.
    pub async fn start(&self) -> Result<(), JobError> {
        info!("Starting job scheduler");

        self.add_sweep_job().await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| JobError::SchedulerError(e.to_string()))?;

        info!("Job scheduler started successfully");

        Ok(())
    }

    /// Stop the job scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobError> {
        info!("Shutting down job scheduler");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| JobError::SchedulerError(e.to_string()))?;
        Ok(())
    }

    /// Add the notification sweep job.
    async fn add_sweep_job(&self) -> Result<(), JobError> {
        let db = Arc::clone(&self.db);
        let notifier = Arc::clone(&self.notifier);
        let rules = Arc::clone(&self.rules);

        let job = Job::new_async(self.config.sweep_cron.as_str(), move |_uuid, _l| {
            let db = Arc::clone(&db);
            let notifier = Arc::clone(&notifier);
            let rules = Arc::clone(&rules);
            Box::pin(async move {
                let now = Utc::now();
                info!("Running notification sweep at {}", now);

                match run_expiration_notice_sweep(&db, notifier.as_ref(), &rules, now).await {
                    Ok(count) => {
                        info!("Notification sweep: {} client(s) notified", count);
                    }
                    Err(e) => {
                        error!("Notification sweep failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| JobError::SchedulerError(e.to_string()))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| JobError::SchedulerError(e.to_string()))?;

        info!(
            "Added notification sweep job (schedule: {})",
            self.config.sweep_cron
        );

        Ok(())
    }

    /// Run the sweep immediately as of `reference`.
    pub async fn run_notification_sweep_now(
        &self,
        reference: DateTime<Utc>,
    ) -> Result<u32, JobError> {
        run_expiration_notice_sweep(&self.db, self.notifier.as_ref(), &self.rules, reference).await
    }
}

/// Errors that can occur in the job scheduler.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<crate::errors::PortalError> for JobError {
    fn from(err: crate::errors::PortalError) -> Self {
        JobError::DatabaseError(err.to_string())
    }
}
