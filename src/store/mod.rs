//! Storage seam used by the notification sweep.
//!
//! The sweep only needs a handful of query shapes, so any backend that can
//! answer them works: the SQL [`crate::server::database::Database`] or the
//! [`InMemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::PortalResult;
use crate::models::{Client, License, NewNotificationSummary, NotificationSummary};

mod memory;

pub use memory::InMemoryStore;

#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Distinct ids of clients owning a license that expires in `[start, end)`.
    async fn client_ids_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortalResult<Vec<i64>>;

    /// Every license held by a client.
    async fn licenses_for_client(&self, client_id: i64) -> PortalResult<Vec<License>>;

    /// A client together with its admin contact.
    async fn get_client(&self, client_id: i64) -> PortalResult<Option<Client>>;

    /// Append one summary record. A single atomic insert.
    async fn record_notification_summary(
        &self,
        summary: NewNotificationSummary,
    ) -> PortalResult<NotificationSummary>;
}
