use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::{PortalError, PortalResult};
use crate::models::{
    AdminContact, Client, License, NewAdminContact, NewClient, NewLicense,
    NewNotificationSummary, NotificationSummary,
};

use super::LicenseStore;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    contacts: BTreeMap<i64, AdminContact>,
    clients: BTreeMap<i64, NewClient>,
    licenses: Vec<License>,
    summaries: Vec<NotificationSummary>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`LicenseStore`] held in process memory.
///
/// Removing a client leaves its licenses behind, which mimics a client
/// vanishing between the candidate query and the client lookup.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> PortalResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PortalError::StorageError("failed to acquire store lock".into()))
    }

    pub fn add_admin_contact(&self, contact: NewAdminContact) -> PortalResult<AdminContact> {
        let mut state = self.state()?;
        let id = state.allocate_id();
        let contact = AdminContact {
            id,
            username: contact.username,
            email: contact.email,
        };
        state.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    pub fn add_client(&self, client: NewClient) -> PortalResult<Client> {
        let mut state = self.state()?;

        let admin_poc = state
            .contacts
            .get(&client.admin_poc_id)
            .cloned()
            .ok_or_else(|| {
                PortalError::NotFound(format!("admin contact {}", client.admin_poc_id))
            })?;

        if state
            .clients
            .values()
            .any(|existing| existing.client_name == client.client_name)
        {
            return Err(PortalError::InvalidRequest(format!(
                "client name already taken: {}",
                client.client_name
            )));
        }

        let id = state.allocate_id();
        state.clients.insert(id, client.clone());

        Ok(Client {
            id,
            client_name: client.client_name,
            poc_contact_name: client.poc_contact_name,
            poc_contact_email: client.poc_contact_email,
            admin_poc,
        })
    }

    pub fn add_license(&self, license: NewLicense) -> PortalResult<License> {
        let mut state = self.state()?;

        if !state.clients.contains_key(&license.client_id) {
            return Err(PortalError::NotFound(format!("client {}", license.client_id)));
        }

        let id = state.allocate_id();
        let license = License {
            id,
            client_id: license.client_id,
            package: license.package,
            license_type: license.license_type,
            created_datetime: license.created_datetime,
            expiration_datetime: Some(license.expiration_datetime),
        };
        state.licenses.push(license.clone());
        Ok(license)
    }

    /// Drop a client record but keep its licenses.
    pub fn remove_client(&self, client_id: i64) -> PortalResult<bool> {
        Ok(self.state()?.clients.remove(&client_id).is_some())
    }

    pub fn summaries(&self) -> PortalResult<Vec<NotificationSummary>> {
        Ok(self.state()?.summaries.clone())
    }
}

#[async_trait]
impl LicenseStore for InMemoryStore {
    async fn client_ids_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortalResult<Vec<i64>> {
        let state = self.state()?;
        let ids: BTreeSet<i64> = state
            .licenses
            .iter()
            .filter(|license| {
                license
                    .expiration_datetime
                    .is_some_and(|expiration| start <= expiration && expiration < end)
            })
            .map(|license| license.client_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn licenses_for_client(&self, client_id: i64) -> PortalResult<Vec<License>> {
        let state = self.state()?;
        Ok(state
            .licenses
            .iter()
            .filter(|license| license.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn get_client(&self, client_id: i64) -> PortalResult<Option<Client>> {
        let state = self.state()?;
        let Some(client) = state.clients.get(&client_id) else {
            return Ok(None);
        };
        let Some(admin_poc) = state.contacts.get(&client.admin_poc_id) else {
            return Ok(None);
        };

        Ok(Some(Client {
            id: client_id,
            client_name: client.client_name.clone(),
            poc_contact_name: client.poc_contact_name.clone(),
            poc_contact_email: client.poc_contact_email.clone(),
            admin_poc: admin_poc.clone(),
        }))
    }

    async fn record_notification_summary(
        &self,
        summary: NewNotificationSummary,
    ) -> PortalResult<NotificationSummary> {
        let mut state = self.state()?;
        let id = state.allocate_id();
        let record = NotificationSummary {
            id,
            sending_date: summary.sending_date,
            client_id: summary.client_id,
            admin_poc_id: summary.admin_poc_id,
            quantity_of_notified_licenses: summary.quantity_of_notified_licenses,
        };
        state.summaries.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LicenseType, Package};
    use chrono::{Duration, TimeZone};

    fn seeded() -> (InMemoryStore, Client) {
        let store = InMemoryStore::new();
        let contact = store
            .add_admin_contact(NewAdminContact {
                username: "ops".into(),
                email: "ops@portal.test".into(),
            })
            .unwrap();
        let client = store
            .add_client(NewClient {
                client_name: "Initech".into(),
                poc_contact_name: "Bill".into(),
                poc_contact_email: "bill@initech.test".into(),
                admin_poc_id: contact.id,
            })
            .unwrap();
        (store, client)
    }

    #[tokio::test]
    async fn range_query_is_half_open_and_distinct() {
        let (store, client) = seeded();
        let start = Utc.with_ymd_and_hms(2023, 8, 14, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);

        for expiration in [start, start + Duration::hours(5), end] {
            store
                .add_license(NewLicense {
                    client_id: client.id,
                    package: Package::JavascriptSdk,
                    license_type: LicenseType::Production,
                    created_datetime: start - Duration::days(90),
                    expiration_datetime: expiration,
                })
                .unwrap();
        }

        let ids = store.client_ids_expiring_between(start, end).await.unwrap();
        assert_eq!(ids, vec![client.id]);

        let later = store
            .client_ids_expiring_between(end + Duration::seconds(1), end + Duration::days(1))
            .await
            .unwrap();
        assert!(later.is_empty());
    }

    #[test]
    fn duplicate_client_names_are_rejected() {
        let (store, client) = seeded();
        let err = store
            .add_client(NewClient {
                client_name: "Initech".into(),
                poc_contact_name: "Peter".into(),
                poc_contact_email: "peter@initech.test".into(),
                admin_poc_id: client.admin_poc.id,
            })
            .unwrap_err();
        assert!(matches!(err, PortalError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn removed_client_is_not_found() {
        let (store, client) = seeded();
        assert!(store.remove_client(client.id).unwrap());
        assert!(store.get_client(client.id).await.unwrap().is_none());
    }
}
