//! Expiration notice rules.
//!
//! A license is due for a notice on a given day when its expiration falls in
//! any of three windows, measured from the start of that day (UTC):
//!
//! - **Imminent**: expires today or within the next `imminent_window_days`.
//! - **Monthly reminder**: expires later this calendar month, and today is one
//!   of the reminder weekdays (Monday by default).
//! - **Advance notice**: expires exactly `advance_notice_months` calendar
//!   months from today, on the same day of the month.
//!
//! Already-expired licenses never qualify. Every check takes the reference
//! instant as a parameter; nothing here reads the clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use std::fmt;

use crate::config::NotificationConfig;
use crate::errors::{PortalError, PortalResult};
use crate::models::License;

/// Tunable window sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRules {
    /// Inclusive day count of the imminent window (a week plus one day).
    pub imminent_window_days: i64,
    /// Days on which same-month reminders fire.
    pub reminder_weekdays: Vec<Weekday>,
    /// Calendar months between the advance notice and the expiration.
    pub advance_notice_months: i32,
}

impl Default for WindowRules {
    fn default() -> Self {
        Self {
            imminent_window_days: 8,
            reminder_weekdays: vec![Weekday::Mon],
            advance_notice_months: 4,
        }
    }
}

/// The window that made a license due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerWindow {
    Imminent,
    MonthlyReminder,
    AdvanceNotice,
}

impl fmt::Display for TriggerWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerWindow::Imminent => "imminent",
            TriggerWindow::MonthlyReminder => "monthly_reminder",
            TriggerWindow::AdvanceNotice => "advance_notice",
        };
        write!(f, "{}", s)
    }
}

/// Half-open expiration range `[start, end)` used to pre-select candidates
/// from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub window: TriggerWindow,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Midnight UTC of the day containing `instant`.
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    midnight(instant.date_naive())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Calendar month difference, ignoring the day of the month.
///
/// `diff_month(2023-12-01, 2023-08-31) == 4`
pub fn diff_month(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i32 {
    (later.year() - earlier.year()) * 12 + later.month() as i32 - earlier.month() as i32
}

/// First day of the month `months` after the month of `date`.
fn first_of_month_offset(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = date
        .year()
        .checked_mul(12)?
        .checked_add(date.month0() as i32)?
        .checked_add(months)?;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

/// `start` plus `days` whole days, or `None` past the representable range.
fn add_days(start: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::try_days(days)?)
}

impl WindowRules {
    /// Build rules from the `notifications` configuration section.
    ///
    /// Rejects window sizes outside the bounds checked by
    /// [`NotificationConfig::validate`].
    pub fn from_config(config: &NotificationConfig) -> PortalResult<Self> {
        config.validate()?;

        let advance_notice_months = i32::try_from(config.advance_notice_months).map_err(|_| {
            PortalError::ConfigError("notifications.advance_notice_months is too large".into())
        })?;

        Ok(Self {
            imminent_window_days: i64::from(config.imminent_window_days),
            reminder_weekdays: config.reminder_weekdays()?,
            advance_notice_months,
        })
    }

    /// First window `expiration` falls in as of `reference`, if any.
    pub fn matching_window(
        &self,
        expiration: DateTime<Utc>,
        reference: DateTime<Utc>,
    ) -> Option<TriggerWindow> {
        let today = start_of_day(reference);

        // Everything below assumes the license has not expired yet.
        if expiration < today {
            return None;
        }

        if (expiration - today).num_days() <= self.imminent_window_days {
            return Some(TriggerWindow::Imminent);
        }

        let months = diff_month(expiration, today);

        if months == 0 && self.reminder_weekdays.contains(&today.weekday()) {
            return Some(TriggerWindow::MonthlyReminder);
        }

        if months == self.advance_notice_months && expiration.day() == today.day() {
            return Some(TriggerWindow::AdvanceNotice);
        }

        None
    }

    /// Whether a license expiring at `expiration` gets a notice on the day of
    /// `reference`.
    pub fn is_notification_due(&self, expiration: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
        self.matching_window(expiration, reference).is_some()
    }

    /// Like [`WindowRules::is_notification_due`]; a license without a
    /// readable expiration is never due.
    pub fn is_license_due(&self, license: &License, reference: DateTime<Utc>) -> bool {
        license
            .expiration_datetime
            .is_some_and(|expiration| self.is_notification_due(expiration, reference))
    }

    /// Expiration ranges covering every license that can be due on the day
    /// of `reference`. Ranges may overlap.
    pub fn query_ranges(&self, reference: DateTime<Utc>) -> Vec<QueryRange> {
        let today = start_of_day(reference);
        let date = today.date_naive();
        let mut ranges = Vec::with_capacity(3);

        // Window sizes past the calendar's range yield no range for that
        // window rather than a panic.
        if let Some(end) = self
            .imminent_window_days
            .checked_add(1)
            .and_then(|days| add_days(today, days))
        {
            ranges.push(QueryRange {
                window: TriggerWindow::Imminent,
                start: today,
                end,
            });
        }

        if self.reminder_weekdays.contains(&date.weekday()) {
            if let Some(next_month) = first_of_month_offset(date, 1) {
                ranges.push(QueryRange {
                    window: TriggerWindow::MonthlyReminder,
                    start: today,
                    end: midnight(next_month),
                });
            }
        }

        // No range when the target month is too short (e.g. the 31st).
        let target_day = first_of_month_offset(date, self.advance_notice_months)
            .and_then(|first| first.with_day(date.day()));
        if let Some(day) = target_day {
            let start = midnight(day);
            if let Some(end) = add_days(start, 1) {
                ranges.push(QueryRange {
                    window: TriggerWindow::AdvanceNotice,
                    start,
                    end,
                });
            }
        }

        ranges
    }
}

/// [`WindowRules::is_notification_due`] with the default rules.
pub fn is_notification_due(expiration: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
    WindowRules::default().is_notification_due(expiration, reference)
}
