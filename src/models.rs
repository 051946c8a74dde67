//! Domain records: admin contacts, clients, licenses and notification summaries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PortalError, PortalResult};

/// Expiration applied to a license created without one.
pub const DEFAULT_LICENSE_EXPIRATION_DAYS: i64 = 90;

/// Package a license grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Package {
    JavascriptSdk,
    IosSdk,
    AndroidSdk,
}

impl Package {
    /// Stable numeric code used in storage.
    pub fn code(self) -> i32 {
        match self {
            Package::JavascriptSdk => 0,
            Package::IosSdk => 1,
            Package::AndroidSdk => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Package::JavascriptSdk),
            1 => Some(Package::IosSdk),
            2 => Some(Package::AndroidSdk),
            _ => None,
        }
    }
}

/// Commercial type of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Production,
    Evaluation,
}

impl LicenseType {
    pub fn code(self) -> i32 {
        match self {
            LicenseType::Production => 0,
            LicenseType::Evaluation => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(LicenseType::Production),
            1 => Some(LicenseType::Evaluation),
            _ => None,
        }
    }
}

/// Staff member responsible for one or more clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminContact {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A client holding licenses.
///
/// Notifications go to the client's admin contact, not the client's own
/// point of contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub client_name: String,
    pub poc_contact_name: String,
    pub poc_contact_email: String,
    pub admin_poc: AdminContact,
}

impl Client {
    /// Address expiration notices are sent to.
    pub fn notification_email(&self) -> &str {
        &self.admin_poc.email
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.client_name)
    }
}

/// A license granting a client access to a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: i64,
    pub client_id: i64,
    pub package: Package,
    pub license_type: LicenseType,
    pub created_datetime: DateTime<Utc>,
    /// `None` when the stored value is missing or unreadable.
    pub expiration_datetime: Option<DateTime<Utc>>,
}

/// Audit record of one notification sent to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub id: i64,
    pub sending_date: DateTime<Utc>,
    pub client_id: i64,
    pub admin_poc_id: i64,
    pub quantity_of_notified_licenses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdminContact {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub client_name: String,
    pub poc_contact_name: String,
    pub poc_contact_email: String,
    pub admin_poc_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLicense {
    pub client_id: i64,
    pub package: Package,
    pub license_type: LicenseType,
    pub created_datetime: DateTime<Utc>,
    pub expiration_datetime: DateTime<Utc>,
}

impl NewLicense {
    /// Build a license created at `created`, expiring after `expiration_days`
    /// unless an explicit expiration is given.
    ///
    /// Fails with `InvalidRequest` when the default expiration falls outside
    /// the representable calendar.
    pub fn issued(
        client_id: i64,
        package: Package,
        license_type: LicenseType,
        created: DateTime<Utc>,
        expiration: Option<DateTime<Utc>>,
        expiration_days: i64,
    ) -> PortalResult<Self> {
        let expiration_datetime = match expiration {
            Some(expiration) => expiration,
            None => default_license_expiration(created, expiration_days).ok_or_else(|| {
                PortalError::InvalidRequest(format!(
                    "expiration {expiration_days} days after {created} is out of range"
                ))
            })?,
        };

        Ok(Self {
            client_id,
            package,
            license_type,
            created_datetime: created,
            expiration_datetime,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotificationSummary {
    pub sending_date: DateTime<Utc>,
    pub client_id: i64,
    pub admin_poc_id: i64,
    pub quantity_of_notified_licenses: u32,
}

/// Default expiration for a license created at `created`.
pub fn default_license_expiration(created: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    created.checked_add_signed(Duration::try_days(days)?)
}
