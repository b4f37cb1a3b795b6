//! Attendance projection models.
//!
//! [`DailyAttendance`] is a derived, cached projection of the raw punch
//! stream: one row per employee and local calendar date, always recomputable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::UnknownVariant;

/// The attendance status of an employee on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// No punch-in was recorded.
    Absent,
    /// Punched in, no completed punch-out yet.
    Working,
    /// Punched in and out.
    Present,
    /// The employee is not active; punches are not classified.
    Inactive,
}

impl AttendanceStatus {
    /// Returns the stored text form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Working => "Working",
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Absent" => Ok(AttendanceStatus::Absent),
            "Working" => Ok(AttendanceStatus::Working),
            "Present" => Ok(AttendanceStatus::Present),
            "Inactive" => Ok(AttendanceStatus::Inactive),
            other => Err(UnknownVariant::new("attendance status", other)),
        }
    }
}

/// A worked duration in whole minutes, never negative.
///
/// Displays and serializes as `HH:MM`; hours may exceed 24 for weekly totals.
///
/// # Example
///
/// ```
/// use hr_backoffice::models::WorkedDuration;
/// use chrono::TimeDelta;
///
/// let worked = WorkedDuration::from_delta(TimeDelta::seconds(8 * 3600 + 35 * 60 + 59));
/// assert_eq!(worked.to_string(), "08:35");
/// assert_eq!(WorkedDuration::from_delta(TimeDelta::minutes(-5)).to_string(), "00:00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkedDuration(i64);

impl WorkedDuration {
    /// The zero duration.
    pub const ZERO: WorkedDuration = WorkedDuration(0);

    /// Builds a duration from minutes, clamping negatives to zero.
    pub fn from_minutes(minutes: i64) -> Self {
        WorkedDuration(minutes.max(0))
    }

    /// Builds a duration from a time delta, truncated to whole minutes.
    pub fn from_delta(delta: TimeDelta) -> Self {
        Self::from_minutes(delta.num_minutes())
    }

    /// Returns the duration in minutes.
    pub fn minutes(&self) -> i64 {
        self.0
    }
}

impl std::ops::Add for WorkedDuration {
    type Output = WorkedDuration;

    fn add(self, rhs: WorkedDuration) -> WorkedDuration {
        WorkedDuration(self.0 + rhs.0)
    }
}

impl std::iter::Sum for WorkedDuration {
    fn sum<I: Iterator<Item = WorkedDuration>>(iter: I) -> Self {
        iter.fold(WorkedDuration::ZERO, |acc, d| acc + d)
    }
}

impl fmt::Display for WorkedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for WorkedDuration {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UnknownVariant::new("worked duration", s);
        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        let hours: i64 = hours.parse().map_err(|_| invalid())?;
        let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
        if hours < 0 || !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .map(WorkedDuration)
            .ok_or_else(invalid)
    }
}

impl Serialize for WorkedDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkedDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One employee's attendance for one local calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAttendance {
    /// The employee.
    pub emp_id: String,
    /// The local calendar date.
    pub date: NaiveDate,
    /// The resolved punch-in, in the service timezone.
    pub punch_in: Option<DateTime<FixedOffset>>,
    /// The resolved punch-out, in the service timezone.
    pub punch_out: Option<DateTime<FixedOffset>>,
    /// Worked time; zero unless the day is `Present`.
    pub total_hours: WorkedDuration,
    /// The classification.
    pub status: AttendanceStatus,
}

impl DailyAttendance {
    /// An `Absent` day with no punches.
    pub fn absent(emp_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            emp_id: emp_id.into(),
            date,
            punch_in: None,
            punch_out: None,
            total_hours: WorkedDuration::ZERO,
            status: AttendanceStatus::Absent,
        }
    }
}

/// How the weekly total treats today's open session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyMode {
    /// Only `Present` days count.
    #[default]
    Settled,
    /// Additionally counts today's `Working` session up to now.
    AsOfNow,
}

/// Worked time from the most recent Monday through today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAttendance {
    /// The employee.
    pub emp_id: String,
    /// The Monday the week starts on.
    pub week_start: NaiveDate,
    /// The last day included (today).
    pub through: NaiveDate,
    /// Per-day rows, Monday first.
    pub days: Vec<DailyAttendance>,
    /// Sum of counted durations.
    pub total_hours: WorkedDuration,
    /// The mode used for the total.
    pub mode: WeeklyMode,
}
