//! Daily attendance classification.
//!
//! Two policies resolve a day's punches into a punch-in and punch-out:
//!
//! - [`ClassificationPolicy::OfficeHours`]: the punch-in is the earliest punch
//!   in `[punch_in_from, punch_out_from)` and the punch-out is the earliest
//!   punch at or after `punch_out_from`. The two windows are disjoint.
//! - [`ClassificationPolicy::FreePunch`]: the earliest and latest punches of
//!   the day.
//!
//! Status then follows from which punches resolved:
//!
//! | punch_in | punch_out     | status  | total_hours      |
//! |----------|---------------|---------|------------------|
//! | none     | any           | Absent  | 00:00            |
//! | set      | none or equal | Working | 00:00            |
//! | set      | later         | Present | out - in, floor  |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceStatus, DailyAttendance, WorkedDuration};

/// How a day's punches are reduced to a punch-in and a punch-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Fixed office hours with disjoint punch-in and punch-out windows.
    OfficeHours {
        /// Start of the punch-in window (local time).
        punch_in_from: NaiveTime,
        /// Start of the punch-out window (local time); ends the punch-in window.
        punch_out_from: NaiveTime,
    },
    /// Earliest punch in, latest punch out.
    FreePunch,
}

/// Classifies one employee's punches for one local date.
///
/// Punches outside `date` (in `offset` local time) are ignored, so the whole
/// punch stream of a wider range may be passed in.
///
/// # Example
///
/// ```
/// use hr_backoffice::attendance::{classify_day, ClassificationPolicy};
/// use hr_backoffice::models::AttendanceStatus;
/// use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
///
/// let ist = FixedOffset::east_opt(19800).unwrap();
/// let policy = ClassificationPolicy::OfficeHours {
///     punch_in_from: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
///     punch_out_from: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
/// };
/// let punches = [
///     ist.with_ymd_and_hms(2026, 10, 19, 10, 35, 0).unwrap().with_timezone(&Utc),
///     ist.with_ymd_and_hms(2026, 10, 19, 19, 10, 0).unwrap().with_timezone(&Utc),
/// ];
/// let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
///
/// let day = classify_day("EMP001", date, &punches, &policy, ist);
/// assert_eq!(day.status, AttendanceStatus::Present);
/// assert_eq!(day.total_hours.to_string(), "08:35");
/// ```
pub fn classify_day(
    emp_id: &str,
    date: NaiveDate,
    punches: &[DateTime<Utc>],
    policy: &ClassificationPolicy,
    offset: FixedOffset,
) -> DailyAttendance {
    let local: Vec<DateTime<FixedOffset>> = punches
        .iter()
        .map(|p| p.with_timezone(&offset))
        .filter(|p| p.date_naive() == date)
        .collect();

    let (punch_in, punch_out) = match policy {
        ClassificationPolicy::OfficeHours {
            punch_in_from,
            punch_out_from,
        } => {
            let punch_in = local
                .iter()
                .filter(|p| p.time() >= *punch_in_from && p.time() < *punch_out_from)
                .min()
                .copied();
            let punch_out = local
                .iter()
                .filter(|p| p.time() >= *punch_out_from)
                .min()
                .copied();
            (punch_in, punch_out)
        }
        ClassificationPolicy::FreePunch => {
            (local.iter().min().copied(), local.iter().max().copied())
        }
    };

    resolve(emp_id, date, punch_in, punch_out)
}

fn resolve(
    emp_id: &str,
    date: NaiveDate,
    punch_in: Option<DateTime<FixedOffset>>,
    punch_out: Option<DateTime<FixedOffset>>,
) -> DailyAttendance {
    let (punch_out, total_hours, status) = match (punch_in, punch_out) {
        (None, out) => (out, WorkedDuration::ZERO, AttendanceStatus::Absent),
        (Some(i), Some(o)) if o > i => (
            Some(o),
            WorkedDuration::from_delta(o - i),
            AttendanceStatus::Present,
        ),
        (Some(_), _) => (None, WorkedDuration::ZERO, AttendanceStatus::Working),
    };
    DailyAttendance {
        emp_id: emp_id.to_string(),
        date,
        punch_in,
        punch_out,
        total_hours,
        status,
    }
}

/// The row reported for an employee whose active flag is off.
pub fn inactive_day(emp_id: &str, date: NaiveDate) -> DailyAttendance {
    DailyAttendance {
        status: AttendanceStatus::Inactive,
        ..DailyAttendance::absent(emp_id, date)
    }
}
