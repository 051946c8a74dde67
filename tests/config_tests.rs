//! Environment overrides for the global configuration.

use std::env;

use chrono::Weekday;
use serial_test::serial;

use license_portal::config::{get_config, PortalConfig};
use license_portal::eligibility::WindowRules;

#[test]
#[serial]
fn environment_overrides_defaults() {
    // The configuration is cached on first access, so set everything up front.
    env::set_var("PORTAL_LOG_LEVEL", "debug");
    env::set_var("PORTAL_ADVANCE_NOTICE_MONTHS", "3");
    env::set_var("PORTAL_SWEEP_CRON", "0 15 7 * * *");

    let config = get_config().expect("config loads");

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.notifications.advance_notice_months, 3);
    assert_eq!(config.jobs.sweep_cron, "0 15 7 * * *");

    let rules = WindowRules::from_config(&config.notifications).unwrap();
    assert_eq!(rules.advance_notice_months, 3);

    // Cached: later changes are not picked up.
    env::set_var("PORTAL_LOG_LEVEL", "error");
    assert_eq!(get_config().unwrap().logging.level, "debug");

    env::remove_var("PORTAL_LOG_LEVEL");
    env::remove_var("PORTAL_ADVANCE_NOTICE_MONTHS");
    env::remove_var("PORTAL_SWEEP_CRON");
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
fn unsupported_database_is_rejected() {
    let mut config = PortalConfig::default();
    config.database.db_type = "mongodb".into();
    assert!(config.validate().is_err());
}

#[test]
fn default_windows_match_default_rules() {
    let config = PortalConfig::default();
    let rules = WindowRules::from_config(&config.notifications).unwrap();
    assert_eq!(rules, WindowRules::default());
    assert_eq!(rules.reminder_weekdays, vec![Weekday::Mon]);
}
