//! Scheduled notification sweep.
//!
//! Reads the clock once per run and hands the instant to
//! [`crate::sweep::run_notification_sweep`].

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::eligibility::WindowRules;
use crate::notifier::Notifier;
use crate::server::database::Database;
use crate::sweep::run_notification_sweep;

use super::JobError;

/// Run one sweep as of `reference`.
///
/// Returns the number of clients notified.
pub async fn run_expiration_notice_sweep(
    db: &Database,
    notifier: &dyn Notifier,
    rules: &WindowRules,
    reference: DateTime<Utc>,
) -> Result<u32, JobError> {
    debug!("Running expiration notice sweep as of {}", reference);

    let report = run_notification_sweep(db, notifier, rules, reference).await?;

    Ok(report.notified_clients)
}
