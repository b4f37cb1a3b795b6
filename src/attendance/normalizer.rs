//! Device timestamp normalization.
//!
//! The biometric device reports timestamps as text in a fixed layout:
//!
//! ```text
//! Mon Oct 19 2026 10:35:00 GMT+0530 (India Standard Time)
//! ```
//!
//! The first five fields (weekday, month, day, year, time) are parsed into a
//! calendar-naive local timestamp. Any trailing zone text is ignored; the
//! service's configured offset is applied instead.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::error::{HrError, HrResult};

/// chrono layout of the leading fields of a device timestamp.
pub const DEVICE_TIMESTAMP_LAYOUT: &str = "%a %b %d %Y %H:%M:%S";

const LAYOUT_FIELDS: usize = 5;

/// Parses device timestamp text into a naive local timestamp.
///
/// # Example
///
/// ```
/// use hr_backoffice::attendance::normalize;
///
/// let local = normalize("Mon Oct 19 2026 10:35:00 GMT+0530 (India Standard Time)").unwrap();
/// assert_eq!(local.to_string(), "2026-10-19 10:35:00");
/// assert!(normalize("19/10/2026 10:35").is_err());
/// ```
pub fn normalize(raw: &str) -> HrResult<NaiveDateTime> {
    let fields: Vec<&str> = raw.split_whitespace().take(LAYOUT_FIELDS).collect();
    if fields.len() < LAYOUT_FIELDS {
        return Err(HrError::validation(
            "timestamp",
            format!("'{}' does not match the device layout", raw),
        ));
    }
    NaiveDateTime::parse_from_str(&fields.join(" "), DEVICE_TIMESTAMP_LAYOUT).map_err(|e| {
        HrError::validation("timestamp", format!("'{}' is not a valid timestamp: {}", raw, e))
    })
}

/// Interprets a naive local timestamp in `offset` and returns the instant.
///
/// Fails when the shifted timestamp falls outside chrono's representable range.
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> HrResult<DateTime<Utc>> {
    let utc = local
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
        .ok_or_else(|| {
            HrError::validation("timestamp", format!("'{}' is out of the representable range", local))
        })?;
    Ok(Utc.from_utc_datetime(&utc))
}

/// Normalizes device text straight to an instant.
pub fn to_instant(raw: &str, offset: FixedOffset) -> HrResult<DateTime<Utc>> {
    local_to_utc(normalize(raw)?, offset)
}

/// The instant local midnight of `date` begins.
pub fn day_start(date: NaiveDate, offset: FixedOffset) -> HrResult<DateTime<Utc>> {
    local_to_utc(date.and_time(NaiveTime::MIN), offset)
}
