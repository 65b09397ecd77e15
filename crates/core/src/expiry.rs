//! Expiry classification for accounts and customers.
//!
//! A calendar expiry date is treated as expiring at 00:00 UTC of that day,
//! so an account whose expiry date is today is already expired once the
//! day has started.

use crate::types::{AccountStatus, DisplayStatus, ExpiryPriority};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// The instant at which a calendar expiry date takes effect.
pub fn expiry_instant(expiry_date: NaiveDate) -> DateTime<Utc> {
    expiry_date.and_time(NaiveTime::default()).and_utc()
}

/// Classify an expiry date against `now` and a warning window of `warning_days`.
pub fn classify_expiry(
    expiry_date: NaiveDate,
    now: DateTime<Utc>,
    warning_days: u32,
) -> ExpiryPriority {
    let expires_at = expiry_instant(expiry_date);
    if expires_at < now {
        ExpiryPriority::Expired
    } else if expires_at <= now + Duration::days(i64::from(warning_days)) {
        ExpiryPriority::ExpiringSoon
    } else {
        ExpiryPriority::Active
    }
}

/// Whole days until expiry, rounded up. Negative once expired.
pub fn days_until(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let millis = (expiry_instant(expiry_date) - now).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).ceil() as i64
}

/// Expiry date of a customer rental: purchase date plus duration.
/// `None` only when the result would leave the supported calendar range.
pub fn customer_expiry(purchase_date: NaiveDate, duration_days: u32) -> Option<NaiveDate> {
    purchase_date.checked_add_days(Days::new(u64::from(duration_days)))
}

/// Badge for an account: expired and expiring-soon override the stored status.
pub fn account_display_status(
    status: AccountStatus,
    expiry_date: NaiveDate,
    now: DateTime<Utc>,
    warning_days: u32,
) -> DisplayStatus {
    match classify_expiry(expiry_date, now, warning_days) {
        ExpiryPriority::Expired => DisplayStatus::Expired,
        ExpiryPriority::ExpiringSoon => DisplayStatus::ExpiringSoon,
        ExpiryPriority::Active => DisplayStatus::from(status),
    }
}
