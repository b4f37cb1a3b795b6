//! Calendar ranges and weekly totals.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::error::{HrError, HrResult};
use crate::models::{AttendanceStatus, DailyAttendance, WeeklyAttendance, WeeklyMode, WorkedDuration};

/// Longest trailing window that may be requested.
pub const MAX_TRAILING_DAYS: u32 = 366;

/// The Monday on or before `today`.
///
/// # Example
///
/// ```
/// use hr_backoffice::attendance::week_start;
/// use chrono::NaiveDate;
///
/// let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
/// assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
/// ```
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Days::new(u64::from(today.weekday().num_days_from_monday()))
}

/// The inclusive range `today - (days - 1) ..= today`.
pub fn trailing_range(today: NaiveDate, days: u32) -> HrResult<(NaiveDate, NaiveDate)> {
    if days == 0 || days > MAX_TRAILING_DAYS {
        return Err(HrError::validation(
            "days",
            format!("must be between 1 and {}, got {}", MAX_TRAILING_DAYS, days),
        ));
    }
    Ok((today - Days::new(u64::from(days - 1)), today))
}

/// Every date in `from..=to`, earliest first.
pub fn dates_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

/// Sums a week of classified days.
///
/// Only `Present` days count, except that in [`WeeklyMode::AsOfNow`] a
/// `Working` row for `today` contributes the time from its punch-in to `now`.
pub fn summarize_week(
    emp_id: &str,
    today: NaiveDate,
    days: Vec<DailyAttendance>,
    mode: WeeklyMode,
    now: DateTime<Utc>,
) -> WeeklyAttendance {
    let total_hours = days
        .iter()
        .map(|day| counted_hours(day, today, mode, now))
        .sum();
    WeeklyAttendance {
        emp_id: emp_id.to_string(),
        week_start: week_start(today),
        through: today,
        days,
        total_hours,
        mode,
    }
}

fn counted_hours(
    day: &DailyAttendance,
    today: NaiveDate,
    mode: WeeklyMode,
    now: DateTime<Utc>,
) -> WorkedDuration {
    match (day.status, mode, day.punch_in) {
        (AttendanceStatus::Present, _, _) => day.total_hours,
        (AttendanceStatus::Working, WeeklyMode::AsOfNow, Some(punch_in)) if day.date == today => {
            WorkedDuration::from_delta(now - punch_in.with_timezone(&Utc))
        }
        _ => WorkedDuration::ZERO,
    }
}
