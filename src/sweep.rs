//! Notification sweep.
//!
//! One pass over every client with a license in a notice window:
//!
//! 1. Query candidate clients for each window's expiration range.
//! 2. Per client, re-check each license against [`WindowRules`].
//! 3. Send one message listing the due licenses.
//! 4. After a successful send, record a [`NotificationSummary`].
//!
//! A failure while handling one client is logged and the sweep moves on to
//! the next. Clients are handled one at a time, so a client's check, send and
//! record never interleave with another client's.
//!
//! [`NotificationSummary`]: crate::models::NotificationSummary

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::eligibility::WindowRules;
use crate::errors::PortalResult;
use crate::models::{License, NewNotificationSummary};
use crate::notifier::{NotificationMessage, Notifier};
use crate::store::LicenseStore;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Distinct clients returned by the window queries
    pub candidate_clients: u32,
    /// Clients that were sent a notification
    pub notified_clients: u32,
    /// Clients dropped because a lookup failed or the client vanished
    pub skipped_clients: u32,
    /// Clients whose notification could not be delivered
    pub failed_clients: u32,
}

impl SweepReport {
    /// Human-readable summary, e.g. `"2 client(s) notified."`.
    pub fn message(&self) -> String {
        format!("{} client(s) notified.", self.notified_clients)
    }
}

/// Outcome of one client's notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Sent,
    Failed,
    Skipped,
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationEvent::Sent => "sent",
            NotificationEvent::Failed => "failed",
            NotificationEvent::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Log the outcome of one client's notification.
pub fn log_notification_event(
    event: NotificationEvent,
    client_id: i64,
    license_count: usize,
    details: Option<&str>,
) {
    let span = info_span!(
        "notification_event",
        event = %event,
        client_id = client_id,
        licenses = license_count,
    );
    let _enter = span.enter();

    match (event, details) {
        (NotificationEvent::Sent, _) => info!("Expiration notice sent"),
        (NotificationEvent::Failed, Some(reason)) => {
            error!(reason = %reason, "Expiration notice failed")
        }
        (NotificationEvent::Failed, None) => error!("Expiration notice failed"),
        (NotificationEvent::Skipped, Some(reason)) => {
            warn!(reason = %reason, "Client skipped")
        }
        (NotificationEvent::Skipped, None) => warn!("Client skipped"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientOutcome {
    Notified,
    NothingDue,
    Skipped,
    Failed,
}

/// Run one sweep as of `reference`.
///
/// Only a failure of the candidate queries aborts the sweep; everything
/// after that is handled per client.
pub async fn run_notification_sweep(
    store: &dyn LicenseStore,
    notifier: &dyn Notifier,
    rules: &WindowRules,
    reference: DateTime<Utc>,
) -> PortalResult<SweepReport> {
    let mut candidates = BTreeSet::new();

    for range in rules.query_ranges(reference) {
        let ids = store
            .client_ids_expiring_between(range.start, range.end)
            .await?;
        debug!(
            window = %range.window,
            start = %range.start,
            end = %range.end,
            clients = ids.len(),
            "Queried notice window"
        );
        candidates.extend(ids);
    }

    let mut report = SweepReport {
        candidate_clients: candidates.len() as u32,
        ..SweepReport::default()
    };

    for client_id in candidates {
        match notify_client(store, notifier, rules, client_id, reference).await {
            ClientOutcome::Notified => report.notified_clients += 1,
            ClientOutcome::NothingDue => {}
            ClientOutcome::Skipped => report.skipped_clients += 1,
            ClientOutcome::Failed => report.failed_clients += 1,
        }
    }

    info!(
        reference = %reference,
        candidates = report.candidate_clients,
        notified = report.notified_clients,
        skipped = report.skipped_clients,
        failed = report.failed_clients,
        "Notification sweep finished"
    );

    Ok(report)
}

/// Licenses of `licenses` that are due on the day of `reference`.
pub fn due_licenses(
    rules: &WindowRules,
    licenses: Vec<License>,
    reference: DateTime<Utc>,
) -> Vec<License> {
    licenses
        .into_iter()
        .filter(|license| {
            if license.expiration_datetime.is_none() {
                debug!(license_id = license.id, "License has no readable expiration");
            }
            rules.is_license_due(license, reference)
        })
        .collect()
}

async fn notify_client(
    store: &dyn LicenseStore,
    notifier: &dyn Notifier,
    rules: &WindowRules,
    client_id: i64,
    reference: DateTime<Utc>,
) -> ClientOutcome {
    let licenses = match store.licenses_for_client(client_id).await {
        Ok(licenses) => licenses,
        Err(e) => {
            log_notification_event(
                NotificationEvent::Skipped,
                client_id,
                0,
                Some(&e.to_string()),
            );
            return ClientOutcome::Skipped;
        }
    };

    let due = due_licenses(rules, licenses, reference);
    if due.is_empty() {
        debug!(client_id, "No licenses due for this client");
        return ClientOutcome::NothingDue;
    }

    let client = match store.get_client(client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            log_notification_event(
                NotificationEvent::Skipped,
                client_id,
                due.len(),
                Some("client no longer exists"),
            );
            return ClientOutcome::Skipped;
        }
        Err(e) => {
            log_notification_event(
                NotificationEvent::Skipped,
                client_id,
                due.len(),
                Some(&e.to_string()),
            );
            return ClientOutcome::Skipped;
        }
    };

    let quantity = due.len();
    let message = NotificationMessage::license_expiration(&client, due);

    if let Err(e) = notifier.send_notification(&message).await {
        log_notification_event(
            NotificationEvent::Failed,
            client_id,
            quantity,
            Some(&e.to_string()),
        );
        return ClientOutcome::Failed;
    }

    log_notification_event(NotificationEvent::Sent, client_id, quantity, None);

    let summary = NewNotificationSummary {
        sending_date: reference,
        client_id,
        admin_poc_id: client.admin_poc.id,
        quantity_of_notified_licenses: quantity as u32,
    };

    // The message is already out; a lost audit row doesn't undo it.
    if let Err(e) = store.record_notification_summary(summary).await {
        error!(client_id, "Failed to record notification summary: {}", e);
    }

    ClientOutcome::Notified
}
