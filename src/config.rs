//! Configuration system for the license portal.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `PORTAL_SERVER_HOST` - Server bind address
//! - `PORTAL_SERVER_PORT` - Server port
//! - `PORTAL_DATABASE_TYPE` - Database type (sqlite, postgres)
//! - `PORTAL_DATABASE_URL` - Database connection URL
//! - `PORTAL_LOGGING_ENABLED` - Enable log output
//! - `PORTAL_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//! - `PORTAL_IMMINENT_WINDOW_DAYS` - Days ahead covered by the imminent window
//! - `PORTAL_ADVANCE_NOTICE_MONTHS` - Months ahead of the advance notice
//! - `PORTAL_NOTIFIER_KIND` - Notifier implementation (log, webhook)
//! - `PORTAL_NOTIFIER_WEBHOOK_URL` - Mail relay endpoint for the webhook notifier
//! - `PORTAL_SWEEP_ENABLED` - Run the scheduled sweep (requires `background-jobs`)
//! - `PORTAL_SWEEP_CRON` - Cron expression for the scheduled sweep

use chrono::Weekday;
use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{PortalError, PortalResult};

/// Global configuration singleton.
static CONFIG: OnceLock<PortalConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub notifications: NotificationConfig,
    pub notifier: NotifierConfig,
    pub jobs: JobsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type: "sqlite" or "postgres"
    pub db_type: String,
    /// SQLite connection URL
    pub sqlite_url: String,
    /// PostgreSQL connection URL
    pub postgres_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            sqlite_url: "sqlite://license_portal.db?mode=rwc".to_string(),
            postgres_url: "postgres://localhost/license_portal".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

/// Longest accepted imminent window, in days.
pub const MAX_IMMINENT_WINDOW_DAYS: u32 = 366;
/// Furthest accepted advance notice, in months.
pub const MAX_ADVANCE_NOTICE_MONTHS: u32 = 120;
/// Longest accepted default license term, in days.
pub const MAX_DEFAULT_EXPIRATION_DAYS: u32 = 36_500;

/// Expiration notice windows.
///
/// Turned into window rules with
/// [`crate::eligibility::WindowRules::from_config`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Days ahead (inclusive) that count as imminent. One week plus one day.
    pub imminent_window_days: u32,
    /// Weekdays on which same-month reminders go out ("mon", "tuesday", ...)
    pub reminder_weekdays: Vec<String>,
    /// Months ahead of expiration at which the advance notice goes out
    pub advance_notice_months: u32,
    /// Expiration applied to new licenses that don't specify one
    pub default_expiration_days: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            imminent_window_days: 8,
            reminder_weekdays: vec!["mon".to_string()],
            advance_notice_months: 4,
            default_expiration_days: 90,
        }
    }
}

impl NotificationConfig {
    /// Parse the configured reminder weekdays.
    pub fn reminder_weekdays(&self) -> PortalResult<Vec<Weekday>> {
        self.reminder_weekdays
            .iter()
            .map(|day| {
                day.trim().parse::<Weekday>().map_err(|_| {
                    PortalError::ConfigError(format!(
                        "notifications.reminder_weekdays contains an unknown weekday: '{day}'"
                    ))
                })
            })
            .collect()
    }

    /// Check weekdays and window bounds.
    pub fn validate(&self) -> PortalResult<()> {
        self.reminder_weekdays()?;

        if self.imminent_window_days > MAX_IMMINENT_WINDOW_DAYS {
            return Err(PortalError::ConfigError(format!(
                "notifications.imminent_window_days must be at most {MAX_IMMINENT_WINDOW_DAYS}"
            )));
        }

        if self.advance_notice_months == 0 || self.advance_notice_months > MAX_ADVANCE_NOTICE_MONTHS
        {
            return Err(PortalError::ConfigError(format!(
                "notifications.advance_notice_months must be between 1 and {MAX_ADVANCE_NOTICE_MONTHS}"
            )));
        }

        if self.default_expiration_days > MAX_DEFAULT_EXPIRATION_DAYS {
            return Err(PortalError::ConfigError(format!(
                "notifications.default_expiration_days must be at most {MAX_DEFAULT_EXPIRATION_DAYS}"
            )));
        }

        Ok(())
    }
}

/// Outbound notifier configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Notifier implementation: "log" or "webhook"
    pub kind: String,
    /// Mail relay endpoint used by the webhook notifier
    pub webhook_url: String,
    /// Request timeout for the webhook notifier
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: "log".to_string(),
            webhook_url: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Scheduled job configuration (requires `background-jobs`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Whether the notification sweep runs on a schedule
    pub sweep_enabled: bool,
    /// Cron expression for the sweep (default: daily at 08:00 UTC)
    pub sweep_cron: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            sweep_enabled: false,
            sweep_cron: "0 0 8 * * *".to_string(),
        }
    }
}

fn config_error(e: config::ConfigError) -> PortalError {
    PortalError::ConfigError(e.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl PortalConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    fn load() -> PortalResult<Self> {
        let defaults = PortalConfig::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)
            .map_err(config_error)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_error)?
            .set_default("database.db_type", defaults.database.db_type)
            .map_err(config_error)?
            .set_default("database.sqlite_url", defaults.database.sqlite_url)
            .map_err(config_error)?
            .set_default("database.postgres_url", defaults.database.postgres_url)
            .map_err(config_error)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_error)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_error)?
            .set_default(
                "notifications.imminent_window_days",
                i64::from(defaults.notifications.imminent_window_days),
            )
            .map_err(config_error)?
            .set_default(
                "notifications.reminder_weekdays",
                defaults.notifications.reminder_weekdays,
            )
            .map_err(config_error)?
            .set_default(
                "notifications.advance_notice_months",
                i64::from(defaults.notifications.advance_notice_months),
            )
            .map_err(config_error)?
            .set_default(
                "notifications.default_expiration_days",
                i64::from(defaults.notifications.default_expiration_days),
            )
            .map_err(config_error)?
            .set_default("notifier.kind", defaults.notifier.kind)
            .map_err(config_error)?
            .set_default("notifier.webhook_url", defaults.notifier.webhook_url)
            .map_err(config_error)?
            .set_default("notifier.timeout_secs", defaults.notifier.timeout_secs as i64)
            .map_err(config_error)?
            .set_default("jobs.sweep_enabled", defaults.jobs.sweep_enabled)
            .map_err(config_error)?
            .set_default("jobs.sweep_cron", defaults.jobs.sweep_cron)
            .map_err(config_error)?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("PORTAL_SERVER_HOST").ok())
            .map_err(config_error)?
            .set_override_option("server.port", env_parsed::<i64>("PORTAL_SERVER_PORT"))
            .map_err(config_error)?
            .set_override_option("database.db_type", env::var("PORTAL_DATABASE_TYPE").ok())
            .map_err(config_error)?
            .set_override_option(
                "database.sqlite_url",
                env::var("PORTAL_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("sqlite")),
            )
            .map_err(config_error)?
            .set_override_option(
                "database.postgres_url",
                env::var("PORTAL_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("postgres")),
            )
            .map_err(config_error)?
            .set_override_option(
                "logging.enabled",
                env_parsed::<bool>("PORTAL_LOGGING_ENABLED"),
            )
            .map_err(config_error)?
            .set_override_option("logging.level", env::var("PORTAL_LOG_LEVEL").ok())
            .map_err(config_error)?
            .set_override_option(
                "notifications.imminent_window_days",
                env_parsed::<i64>("PORTAL_IMMINENT_WINDOW_DAYS"),
            )
            .map_err(config_error)?
            .set_override_option(
                "notifications.advance_notice_months",
                env_parsed::<i64>("PORTAL_ADVANCE_NOTICE_MONTHS"),
            )
            .map_err(config_error)?
            .set_override_option("notifier.kind", env::var("PORTAL_NOTIFIER_KIND").ok())
            .map_err(config_error)?
            .set_override_option(
                "notifier.webhook_url",
                env::var("PORTAL_NOTIFIER_WEBHOOK_URL").ok(),
            )
            .map_err(config_error)?
            .set_override_option("jobs.sweep_enabled", env_parsed::<bool>("PORTAL_SWEEP_ENABLED"))
            .map_err(config_error)?
            .set_override_option("jobs.sweep_cron", env::var("PORTAL_SWEEP_CRON").ok())
            .map_err(config_error)?;

        let settings = builder
            .build()
            .map_err(|e| PortalError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| PortalError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> PortalResult<()> {
        if self.server.port == 0 {
            return Err(PortalError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        match self.database.db_type.as_str() {
            "sqlite" | "postgres" => {}
            other => {
                return Err(PortalError::ConfigError(format!(
                    "database.db_type must be 'sqlite' or 'postgres', got '{other}'"
                )));
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(PortalError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        self.notifications.validate()?;

        match self.notifier.kind.as_str() {
            "log" => {}
            "webhook" if self.notifier.webhook_url.is_empty() => {
                return Err(PortalError::ConfigError(
                    "notifier.webhook_url is required when notifier.kind is 'webhook'".to_string(),
                ));
            }
            "webhook" => {}
            other => {
                return Err(PortalError::ConfigError(format!(
                    "notifier.kind must be 'log' or 'webhook', got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// Loads the configuration on first access and caches it.
pub fn get_config() -> PortalResult<&'static PortalConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = PortalConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is equivalent.
    let _ = CONFIG.set(config);

    CONFIG
        .get()
        .ok_or_else(|| PortalError::ConfigError("configuration was not initialized".to_string()))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
pub fn init_config() -> PortalResult<&'static PortalConfig> {
    get_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notifications.imminent_window_days, 8);
        assert_eq!(config.notifications.advance_notice_months, 4);
        assert_eq!(config.jobs.sweep_cron, "0 0 8 * * *");
    }

    #[test]
    fn reminder_weekdays_accept_short_and_long_names() {
        let config = NotificationConfig {
            reminder_weekdays: vec!["mon".into(), "Thursday".into()],
            ..Default::default()
        };
        assert_eq!(
            config.reminder_weekdays().unwrap(),
            vec![Weekday::Mon, Weekday::Thu]
        );
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        let mut config = PortalConfig::default();
        config.notifications.reminder_weekdays = vec!["someday".into()];
        assert!(matches!(
            config.validate(),
            Err(PortalError::ConfigError(_))
        ));
    }

    #[test]
    fn webhook_notifier_requires_url() {
        let mut config = PortalConfig::default();
        config.notifier.kind = "webhook".into();
        assert!(config.validate().is_err());

        config.notifier.webhook_url = "http://relay.internal/send".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_advance_months_is_rejected() {
        let mut config = PortalConfig::default();
        config.notifications.advance_notice_months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let mut config = PortalConfig::default();
        config.notifications.imminent_window_days = 200_000_000;
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.notifications.advance_notice_months = MAX_ADVANCE_NOTICE_MONTHS + 1;
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.notifications.default_expiration_days = u32::MAX;
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.notifications.imminent_window_days = MAX_IMMINENT_WINDOW_DAYS;
        config.notifications.advance_notice_months = MAX_ADVANCE_NOTICE_MONTHS;
        config.notifications.default_expiration_days = MAX_DEFAULT_EXPIRATION_DAYS;
        assert!(config.validate().is_ok());
    }
}
