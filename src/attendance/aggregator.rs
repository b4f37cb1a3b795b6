//! The attendance aggregator.
//!
//! Derives [`DailyAttendance`] rows from the stored punch stream and writes
//! them to the daily projection. Every derivation reads raw punches, so
//! recomputing a day any number of times yields the same row.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{HrError, HrResult};
use crate::models::{DailyAttendance, Employee, WeeklyAttendance, WeeklyMode};
use crate::store::{Store, Tx};

use super::daily::{ClassificationPolicy, classify_day, inactive_day};
use super::ingest::IngestReport;
use super::normalizer::day_start;
use super::weekly::{dates_between, summarize_week, trailing_range, week_start};

/// Attendance settings resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceSettings {
    /// How punches are reduced to a punch-in and punch-out.
    pub policy: ClassificationPolicy,
    /// The service timezone offset; local dates are taken in this offset.
    pub offset: FixedOffset,
    /// How weekly totals treat today's open session.
    pub weekly_mode: WeeklyMode,
}

/// Computes and caches daily attendance.
#[derive(Clone)]
pub struct AttendanceAggregator {
    store: Store,
    settings: AttendanceSettings,
}

impl AttendanceAggregator {
    /// Creates an aggregator over `store`.
    pub fn new(store: Store, settings: AttendanceSettings) -> Self {
        Self { store, settings }
    }

    /// The settings this aggregator classifies with.
    pub fn settings(&self) -> &AttendanceSettings {
        &self.settings
    }

    /// The local calendar date of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.settings.offset).date_naive()
    }

    /// Recomputes one employee's day and stores the result.
    pub fn recompute_day(&self, emp_id: &str, date: NaiveDate) -> HrResult<DailyAttendance> {
        let mut days = self.recompute_range(emp_id, date, date)?;
        days.pop()
            .ok_or_else(|| HrError::internal("recompute produced no row"))
    }

    /// Recomputes and stores every day in `from..=to` for one employee.
    ///
    /// Days without punches are stored as `Absent`.
    pub fn recompute_range(
        &self,
        emp_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> HrResult<Vec<DailyAttendance>> {
        if to < from {
            return Err(HrError::validation("to", "must not be before from"));
        }
        self.store.write(|tx| {
            let employee = require_employee(tx, emp_id)?;
            let days = self.compute(tx, &employee, from, to)?;
            for day in &days {
                tx.upsert_daily_attendance(day)?;
            }
            debug!(emp_id, %from, %to, days = days.len(), "attendance recomputed");
            Ok(days)
        })
    }

    /// Recomputes `date` for every active employee.
    ///
    /// Each employee is recomputed in its own transaction; a failure for one
    /// is logged and does not stop the others. Returns the number of
    /// employees recomputed.
    pub fn recompute_all(&self, date: NaiveDate) -> HrResult<usize> {
        let employees = self.store.read(|tx| tx.active_employees())?;
        let mut recomputed = 0;
        for employee in &employees {
            match self.recompute_day(&employee.emp_id, date) {
                Ok(_) => recomputed += 1,
                Err(e) => warn!(
                    emp_id = %employee.emp_id,
                    %date,
                    error = %e,
                    "attendance recompute failed"
                ),
            }
        }
        info!(%date, recomputed, total = employees.len(), "daily attendance recomputed");
        Ok(recomputed)
    }

    /// Recomputes every `(employee, date)` an ingest touched.
    pub fn recompute_touched(&self, report: &IngestReport) -> HrResult<Vec<DailyAttendance>> {
        report
            .touched
            .iter()
            .map(|day| self.recompute_day(&day.emp_id, day.date))
            .collect()
    }

    /// Monday-through-today attendance with the configured weekly total.
    pub fn week(&self, emp_id: &str, now: DateTime<Utc>) -> HrResult<WeeklyAttendance> {
        self.week_with_mode(emp_id, now, self.settings.weekly_mode)
    }

    /// Monday-through-today attendance using `mode` for the total.
    pub fn week_with_mode(
        &self,
        emp_id: &str,
        now: DateTime<Utc>,
        mode: WeeklyMode,
    ) -> HrResult<WeeklyAttendance> {
        let today = self.today(now);
        let days = self.recompute_range(emp_id, week_start(today), today)?;
        Ok(summarize_week(emp_id, today, days, mode, now))
    }

    /// One row per day for the `days` days ending today, earliest first.
    ///
    /// Days are derived from raw punches; days with no punches are `Absent`.
    /// Nothing is written to the projection.
    pub fn trailing_window(
        &self,
        emp_id: &str,
        now: DateTime<Utc>,
        days: u32,
    ) -> HrResult<Vec<DailyAttendance>> {
        let (from, to) = trailing_range(self.today(now), days)?;
        self.store.read(|tx| {
            let employee = require_employee(tx, emp_id)?;
            self.compute(tx, &employee, from, to)
        })
    }

    fn compute(
        &self,
        tx: &Tx<'_>,
        employee: &Employee,
        from: NaiveDate,
        to: NaiveDate,
    ) -> HrResult<Vec<DailyAttendance>> {
        let emp_id = employee.emp_id.as_str();
        if !employee.active {
            return Ok(dates_between(from, to)
                .map(|date| inactive_day(emp_id, date))
                .collect());
        }

        let offset = self.settings.offset;
        let end = to
            .checked_add_days(Days::new(1))
            .ok_or_else(|| HrError::validation("to", "date out of range"))?;
        let punches: Vec<DateTime<Utc>> = tx
            .punches_between(emp_id, day_start(from, offset)?, day_start(end, offset)?)?
            .into_iter()
            .map(|p| p.instant)
            .collect();

        Ok(dates_between(from, to)
            .map(|date| classify_day(emp_id, date, &punches, &self.settings.policy, offset))
            .collect())
    }
}

fn require_employee(tx: &Tx<'_>, emp_id: &str) -> HrResult<Employee> {
    tx.employee(emp_id)?.ok_or_else(|| HrError::NotFound {
        entity: "Employee",
        id: emp_id.to_string(),
    })
}
