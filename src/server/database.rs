use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{query, query_as, query_scalar, FromRow};
use std::sync::Arc;
use tracing::{error, warn};

#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

#[cfg(feature = "postgres")]
use sqlx::PgPool;

use crate::config::{get_config, DatabaseConfig};
use crate::errors::{PortalError, PortalResult};
use crate::models::{
    AdminContact, Client, License, LicenseType, NewAdminContact, NewClient, NewLicense,
    NewNotificationSummary, NotificationSummary, Package,
};
use crate::store::LicenseStore;

#[cfg(feature = "sqlite")]
const SQLITE_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admin_contacts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        client_name         TEXT NOT NULL UNIQUE,
        poc_contact_name    TEXT NOT NULL,
        poc_contact_email   TEXT NOT NULL,
        admin_poc_id        INTEGER NOT NULL REFERENCES admin_contacts(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id           INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        package             INTEGER NOT NULL,
        license_type        INTEGER NOT NULL,
        created_datetime    TEXT NOT NULL,
        expiration_datetime TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_licenses_expiration ON licenses(expiration_datetime)",
    r#"
    CREATE TABLE IF NOT EXISTS notification_summaries (
        id                              INTEGER PRIMARY KEY AUTOINCREMENT,
        sending_date                    TEXT NOT NULL,
        client_id                       INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        admin_poc_id                    INTEGER NOT NULL REFERENCES admin_contacts(id) ON DELETE CASCADE,
        quantity_of_notified_licenses   INTEGER NOT NULL
    )
    "#,
];

#[cfg(feature = "postgres")]
const POSTGRES_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admin_contacts (
        id          BIGSERIAL PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id                  BIGSERIAL PRIMARY KEY,
        client_name         TEXT NOT NULL UNIQUE,
        poc_contact_name    TEXT NOT NULL,
        poc_contact_email   TEXT NOT NULL,
        admin_poc_id        BIGINT NOT NULL REFERENCES admin_contacts(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id                  BIGSERIAL PRIMARY KEY,
        client_id           BIGINT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        package             INTEGER NOT NULL,
        license_type        INTEGER NOT NULL,
        created_datetime    TEXT NOT NULL,
        expiration_datetime TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_licenses_expiration ON licenses(expiration_datetime)",
    r#"
    CREATE TABLE IF NOT EXISTS notification_summaries (
        id                              BIGSERIAL PRIMARY KEY,
        sending_date                    TEXT NOT NULL,
        client_id                       BIGINT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        admin_poc_id                    BIGINT NOT NULL REFERENCES admin_contacts(id) ON DELETE CASCADE,
        quantity_of_notified_licenses   INTEGER NOT NULL
    )
    "#,
];

const CLIENT_COLUMNS: &str = "c.id, c.client_name, c.poc_contact_name, c.poc_contact_email, \
     a.id AS admin_poc_id, a.username AS admin_username, a.email AS admin_email";

const LICENSE_COLUMNS: &str =
    "id, client_id, package, license_type, created_datetime, expiration_datetime";

const SUMMARY_COLUMNS: &str =
    "id, sending_date, client_id, admin_poc_id, quantity_of_notified_licenses";

/// Layout of every stored timestamp.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Encode a timestamp as fixed-width UTC text.
///
/// Every stored timestamp uses this format so that range filters can compare
/// the text column directly.
pub fn encode_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a stored timestamp.
///
/// Only the exact output of [`encode_timestamp`] is accepted. Any other text,
/// even a readable date, would sort differently from the range bounds, so it
/// is treated as unreadable.
pub fn decode_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let instant = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()?
        .and_utc();
    (encode_timestamp(instant) == value).then_some(instant)
}

#[derive(Debug, Clone, FromRow)]
struct AdminContactRow {
    id: i64,
    username: String,
    email: String,
}

impl From<AdminContactRow> for AdminContact {
    fn from(row: AdminContactRow) -> Self {
        AdminContact {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ClientRow {
    id: i64,
    client_name: String,
    poc_contact_name: String,
    poc_contact_email: String,
    admin_poc_id: i64,
    admin_username: String,
    admin_email: String,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            client_name: row.client_name,
            poc_contact_name: row.poc_contact_name,
            poc_contact_email: row.poc_contact_email,
            admin_poc: AdminContact {
                id: row.admin_poc_id,
                username: row.admin_username,
                email: row.admin_email,
            },
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct LicenseRow {
    id: i64,
    client_id: i64,
    package: i32,
    license_type: i32,
    created_datetime: String,
    expiration_datetime: Option<String>,
}

impl LicenseRow {
    /// Rows with an unknown package, license type or creation time are
    /// dropped. An unreadable expiration is kept as `None`.
    fn into_license(self) -> Option<License> {
        let (Some(package), Some(license_type)) = (
            Package::from_code(self.package),
            LicenseType::from_code(self.license_type),
        ) else {
            warn!(
                license_id = self.id,
                package = self.package,
                license_type = self.license_type,
                "Ignoring license with unknown package or type"
            );
            return None;
        };

        let Some(created_datetime) = decode_timestamp(&self.created_datetime) else {
            warn!(license_id = self.id, "Ignoring license with unreadable creation time");
            return None;
        };

        let expiration_datetime = match self.expiration_datetime.as_deref() {
            Some(raw) => {
                let decoded = decode_timestamp(raw);
                if decoded.is_none() {
                    warn!(license_id = self.id, raw, "Unreadable license expiration");
                }
                decoded
            }
            None => None,
        };

        Some(License {
            id: self.id,
            client_id: self.client_id,
            package,
            license_type,
            created_datetime,
            expiration_datetime,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct SummaryRow {
    id: i64,
    sending_date: String,
    client_id: i64,
    admin_poc_id: i64,
    quantity_of_notified_licenses: i32,
}

impl SummaryRow {
    fn into_summary(self) -> Option<NotificationSummary> {
        let Some(sending_date) = decode_timestamp(&self.sending_date) else {
            warn!(summary_id = self.id, "Ignoring summary with unreadable sending date");
            return None;
        };

        let Ok(quantity_of_notified_licenses) = u32::try_from(self.quantity_of_notified_licenses)
        else {
            warn!(
                summary_id = self.id,
                quantity = self.quantity_of_notified_licenses,
                "Ignoring summary with negative license count"
            );
            return None;
        };

        Some(NotificationSummary {
            id: self.id,
            sending_date,
            client_id: self.client_id,
            admin_poc_id: self.admin_poc_id,
            quantity_of_notified_licenses,
        })
    }
}

fn read_error(backend: &str, op: &str, e: sqlx::Error) -> PortalError {
    error!("{backend} {op} failed: {e}");
    PortalError::StorageError(format!("database error: {e}"))
}

fn write_error(backend: &str, op: &str, e: sqlx::Error) -> PortalError {
    if let Some(db_error) = e.as_database_error() {
        if db_error.is_unique_violation() {
            return PortalError::InvalidRequest(format!("{op}: record already exists"));
        }
        if db_error.is_foreign_key_violation() {
            return PortalError::NotFound(format!("{op}: referenced record does not exist"));
        }
    }
    read_error(backend, op, e)
}

/// Unified database abstraction over SQLite and Postgres.
///
/// Available variants depend on enabled features:
/// - `sqlite` feature enables `Database::SQLite`
/// - `postgres` feature enables `Database::Postgres`
#[derive(Debug, Clone)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

impl Database {
    /// Connect using the global configuration.
    pub async fn new() -> PortalResult<Arc<Self>> {
        let config = get_config()?;
        Ok(Arc::new(Self::connect(&config.database).await?))
    }

    /// Connect to the database described by `db_config`.
    pub async fn connect(db_config: &DatabaseConfig) -> PortalResult<Self> {
        match db_config.db_type.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let mut options = SqlitePoolOptions::new();
                // Each connection to `sqlite::memory:` opens its own database.
                if db_config.sqlite_url.contains(":memory:") {
                    options = options.max_connections(1);
                }
                let pool = options
                    .connect(&db_config.sqlite_url)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to SQLite: {e}");
                        PortalError::StorageError(format!("failed to connect to SQLite: {e}"))
                    })?;

                Ok(Database::SQLite(pool))
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => Err(PortalError::ConfigError(
                "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
            )),
            #[cfg(feature = "postgres")]
            "postgres" => {
                let pool = PgPool::connect(&db_config.postgres_url)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to PostgreSQL: {e}");
                        PortalError::StorageError(format!(
                            "failed to connect to PostgreSQL: {e}"
                        ))
                    })?;

                Ok(Database::Postgres(pool))
            }
            #[cfg(not(feature = "postgres"))]
            "postgres" => Err(PortalError::ConfigError(
                "PostgreSQL support not compiled in. Enable the 'postgres' feature.".to_string(),
            )),
            other => Err(PortalError::ConfigError(format!(
                "unsupported database type: {other}"
            ))),
        }
    }

    /// Backend name for health reporting.
    pub fn db_type(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Database::Postgres(_) => "postgres",
        }
    }

    /// Whether the database answers a trivial query.
    pub async fn ping(&self) -> bool {
        let result = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query("SELECT 1").execute(pool).await.map(|_| ()),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query("SELECT 1").execute(pool).await.map(|_| ()),
        };
        result.is_ok()
    }

    /// Create missing tables and indexes. Safe to run on every start.
    pub async fn run_migrations(&self) -> PortalResult<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                for statement in SQLITE_MIGRATIONS {
                    query(statement)
                        .execute(pool)
                        .await
                        .map_err(|e| read_error("SQLite", "migration", e))?;
                }
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                for statement in POSTGRES_MIGRATIONS {
                    query(statement)
                        .execute(pool)
                        .await
                        .map_err(|e| read_error("Postgres", "migration", e))?;
                }
            }
        }

        Ok(())
    }

    pub async fn insert_admin_contact(&self, contact: NewAdminContact) -> PortalResult<AdminContact> {
        let row = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, AdminContactRow>(
                "INSERT INTO admin_contacts (username, email) VALUES (?, ?) \
                 RETURNING id, username, email",
            )
            .bind(&contact.username)
            .bind(&contact.email)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("SQLite", "insert_admin_contact", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, AdminContactRow>(
                "INSERT INTO admin_contacts (username, email) VALUES ($1, $2) \
                 RETURNING id, username, email",
            )
            .bind(&contact.username)
            .bind(&contact.email)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("Postgres", "insert_admin_contact", e))?,
        };

        Ok(row.into())
    }

    /// Insert a client. Fails with `NotFound` if the admin contact is missing
    /// and `InvalidRequest` if the name is taken.
    pub async fn insert_client(&self, client: NewClient) -> PortalResult<Client> {
        let id = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_scalar::<_, i64>(
                "INSERT INTO clients (client_name, poc_contact_name, poc_contact_email, admin_poc_id) \
                 VALUES (?, ?, ?, ?) RETURNING id",
            )
            .bind(&client.client_name)
            .bind(&client.poc_contact_name)
            .bind(&client.poc_contact_email)
            .bind(client.admin_poc_id)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("SQLite", "insert_client", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_scalar::<_, i64>(
                "INSERT INTO clients (client_name, poc_contact_name, poc_contact_email, admin_poc_id) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(&client.client_name)
            .bind(&client.poc_contact_name)
            .bind(&client.poc_contact_email)
            .bind(client.admin_poc_id)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("Postgres", "insert_client", e))?,
        };

        self.get_client(id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("client {id}")))
    }

    pub async fn insert_license(&self, license: NewLicense) -> PortalResult<License> {
        let created = encode_timestamp(license.created_datetime);
        let expiration = encode_timestamp(license.expiration_datetime);

        let id = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_scalar::<_, i64>(
                "INSERT INTO licenses (client_id, package, license_type, created_datetime, expiration_datetime) \
                 VALUES (?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(license.client_id)
            .bind(license.package.code())
            .bind(license.license_type.code())
            .bind(&created)
            .bind(&expiration)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("SQLite", "insert_license", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_scalar::<_, i64>(
                "INSERT INTO licenses (client_id, package, license_type, created_datetime, expiration_datetime) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(license.client_id)
            .bind(license.package.code())
            .bind(license.license_type.code())
            .bind(&created)
            .bind(&expiration)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("Postgres", "insert_license", e))?,
        };

        Ok(License {
            id,
            client_id: license.client_id,
            package: license.package,
            license_type: license.license_type,
            created_datetime: license.created_datetime,
            expiration_datetime: Some(license.expiration_datetime),
        })
    }

    /// Notification audit log, newest first, optionally for one client.
    pub async fn list_notification_summaries(
        &self,
        client_id: Option<i64>,
    ) -> PortalResult<Vec<NotificationSummary>> {
        let rows = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                let sql = match client_id {
                    Some(_) => format!(
                        "SELECT {SUMMARY_COLUMNS} FROM notification_summaries \
                         WHERE client_id = ? ORDER BY id DESC"
                    ),
                    None => format!(
                        "SELECT {SUMMARY_COLUMNS} FROM notification_summaries ORDER BY id DESC"
                    ),
                };
                let mut q = query_as::<_, SummaryRow>(&sql);
                if let Some(id) = client_id {
                    q = q.bind(id);
                }
                q.fetch_all(pool)
                    .await
                    .map_err(|e| read_error("SQLite", "list_notification_summaries", e))?
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                let sql = match client_id {
                    Some(_) => format!(
                        "SELECT {SUMMARY_COLUMNS} FROM notification_summaries \
                         WHERE client_id = $1 ORDER BY id DESC"
                    ),
                    None => format!(
                        "SELECT {SUMMARY_COLUMNS} FROM notification_summaries ORDER BY id DESC"
                    ),
                };
                let mut q = query_as::<_, SummaryRow>(&sql);
                if let Some(id) = client_id {
                    q = q.bind(id);
                }
                q.fetch_all(pool)
                    .await
                    .map_err(|e| read_error("Postgres", "list_notification_summaries", e))?
            }
        };

        Ok(rows.into_iter().filter_map(SummaryRow::into_summary).collect())
    }
}

#[async_trait]
impl LicenseStore for Database {
    async fn client_ids_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortalResult<Vec<i64>> {
        let start = encode_timestamp(start);
        let end = encode_timestamp(end);

        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_scalar::<_, i64>(
                "SELECT DISTINCT client_id FROM licenses \
                 WHERE expiration_datetime >= ? AND expiration_datetime < ? \
                 ORDER BY client_id",
            )
            .bind(&start)
            .bind(&end)
            .fetch_all(pool)
            .await
            .map_err(|e| read_error("SQLite", "client_ids_expiring_between", e)),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_scalar::<_, i64>(
                "SELECT DISTINCT client_id FROM licenses \
                 WHERE expiration_datetime >= $1 AND expiration_datetime < $2 \
                 ORDER BY client_id",
            )
            .bind(&start)
            .bind(&end)
            .fetch_all(pool)
            .await
            .map_err(|e| read_error("Postgres", "client_ids_expiring_between", e)),
        }
    }

    async fn licenses_for_client(&self, client_id: i64) -> PortalResult<Vec<License>> {
        let rows = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, LicenseRow>(&format!(
                "SELECT {LICENSE_COLUMNS} FROM licenses WHERE client_id = ? ORDER BY id"
            ))
            .bind(client_id)
            .fetch_all(pool)
            .await
            .map_err(|e| read_error("SQLite", "licenses_for_client", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, LicenseRow>(&format!(
                "SELECT {LICENSE_COLUMNS} FROM licenses WHERE client_id = $1 ORDER BY id"
            ))
            .bind(client_id)
            .fetch_all(pool)
            .await
            .map_err(|e| read_error("Postgres", "licenses_for_client", e))?,
        };

        Ok(rows.into_iter().filter_map(LicenseRow::into_license).collect())
    }

    async fn get_client(&self, client_id: i64) -> PortalResult<Option<Client>> {
        let row = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as::<_, ClientRow>(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients c \
                 JOIN admin_contacts a ON a.id = c.admin_poc_id WHERE c.id = ?"
            ))
            .bind(client_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| read_error("SQLite", "get_client", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_as::<_, ClientRow>(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients c \
                 JOIN admin_contacts a ON a.id = c.admin_poc_id WHERE c.id = $1"
            ))
            .bind(client_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| read_error("Postgres", "get_client", e))?,
        };

        Ok(row.map(Client::from))
    }

    async fn record_notification_summary(
        &self,
        summary: NewNotificationSummary,
    ) -> PortalResult<NotificationSummary> {
        let sending_date = encode_timestamp(summary.sending_date);
        let quantity = i32::try_from(summary.quantity_of_notified_licenses).map_err(|_| {
            PortalError::InvalidRequest("notified license count out of range".to_string())
        })?;

        let id = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_scalar::<_, i64>(
                "INSERT INTO notification_summaries \
                 (sending_date, client_id, admin_poc_id, quantity_of_notified_licenses) \
                 VALUES (?, ?, ?, ?) RETURNING id",
            )
            .bind(&sending_date)
            .bind(summary.client_id)
            .bind(summary.admin_poc_id)
            .bind(quantity)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("SQLite", "record_notification_summary", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => query_scalar::<_, i64>(
                "INSERT INTO notification_summaries \
                 (sending_date, client_id, admin_poc_id, quantity_of_notified_licenses) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(&sending_date)
            .bind(summary.client_id)
            .bind(summary.admin_poc_id)
            .bind(quantity)
            .fetch_one(pool)
            .await
            .map_err(|e| write_error("Postgres", "record_notification_summary", e))?,
        };

        Ok(NotificationSummary {
            id,
            sending_date: summary.sending_date,
            client_id: summary.client_id,
            admin_poc_id: summary.admin_poc_id,
            quantity_of_notified_licenses: summary.quantity_of_notified_licenses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoded_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2023, 8, 14, 0, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(500);
        assert!(encode_timestamp(earlier) < encode_timestamp(later));
        assert_eq!(encode_timestamp(earlier), "2023-08-14T00:00:00.000000Z");
    }

    #[test]
    fn summary_with_negative_count_is_dropped() {
        let row = |quantity| SummaryRow {
            id: 1,
            sending_date: "2023-08-14T08:00:00.000000Z".to_string(),
            client_id: 2,
            admin_poc_id: 3,
            quantity_of_notified_licenses: quantity,
        };

        assert!(row(-1).into_summary().is_none());
        let summary = row(4).into_summary().unwrap();
        assert_eq!(summary.quantity_of_notified_licenses, 4);
    }

    #[test]
    fn decode_accepts_only_the_encoded_form() {
        let expected = Utc.with_ymd_and_hms(2023, 12, 14, 10, 30, 0).unwrap();
        assert_eq!(decode_timestamp("2023-12-14T10:30:00.000000Z"), Some(expected));
        assert_eq!(decode_timestamp(&encode_timestamp(expected)), Some(expected));

        assert_eq!(decode_timestamp("2023-12-14T12:30:00+02:00"), None);
        assert_eq!(decode_timestamp("2023-12-14T10:30:00Z"), None);
        assert_eq!(decode_timestamp("2023-12-14 10:30:00"), None);
        assert_eq!(decode_timestamp(" 2023-12-14T10:30:00.000000Z"), None);
        assert_eq!(decode_timestamp("not a date"), None);
        assert_eq!(decode_timestamp(""), None);
    }
}
