//! Raw punches and the daily attendance projection.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{HrError, HrResult};
use crate::models::{DailyAttendance, PunchEvent, WorkedDuration};

use super::{Tx, is_constraint_violation, parse_column};

fn offset_datetime_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<FixedOffset>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn map_daily(row: &Row<'_>) -> rusqlite::Result<DailyAttendance> {
    Ok(DailyAttendance {
        emp_id: row.get(0)?,
        date: row.get(1)?,
        punch_in: offset_datetime_column(row, 2)?,
        punch_out: offset_datetime_column(row, 3)?,
        total_hours: WorkedDuration::from_minutes(row.get(4)?),
        status: parse_column(row, 5)?,
    })
}

fn map_punch(row: &Row<'_>) -> rusqlite::Result<PunchEvent> {
    let secs: i64 = row.get(1)?;
    Ok(PunchEvent {
        emp_id: row.get(0)?,
        instant: DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, secs))?,
        device_id: row.get(2)?,
    })
}

impl Tx<'_> {
    /// Records a punch.
    ///
    /// Fails with `DuplicatePunch` if the employee already has a punch at the
    /// same instant (second resolution).
    pub fn insert_punch(&self, punch: &PunchEvent) -> HrResult<()> {
        let inserted = self.conn().execute(
            "INSERT INTO punch_events (emp_id, instant_secs, device_id) VALUES (?1, ?2, ?3)",
            params![punch.emp_id, punch.instant.timestamp(), punch.device_id],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(HrError::DuplicatePunch {
                emp_id: punch.emp_id.clone(),
                instant: punch.instant,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Punches of an employee in `[from, to)`, earliest first.
    pub fn punches_between(
        &self,
        emp_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> HrResult<Vec<PunchEvent>> {
        let mut stmt = self.conn().prepare(
            "SELECT emp_id, instant_secs, device_id FROM punch_events
             WHERE emp_id = ?1 AND instant_secs >= ?2 AND instant_secs < ?3
             ORDER BY instant_secs",
        )?;
        let rows = stmt.query_map(
            params![emp_id, from.timestamp(), to.timestamp()],
            map_punch,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inserts or overwrites the projection row for `(emp_id, date)`.
    pub(crate) fn upsert_daily_attendance(&self, day: &DailyAttendance) -> HrResult<()> {
        self.conn().execute(
            "INSERT INTO daily_attendance
             (emp_id, date, punch_in, punch_out, total_minutes, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (emp_id, date) DO UPDATE SET
               punch_in = excluded.punch_in,
               punch_out = excluded.punch_out,
               total_minutes = excluded.total_minutes,
               status = excluded.status",
            params![
                day.emp_id,
                day.date,
                day.punch_in.map(|t| t.to_rfc3339()),
                day.punch_out.map(|t| t.to_rfc3339()),
                day.total_hours.minutes(),
                day.status.as_str()
            ],
        )?;
        Ok(())
    }

    /// The stored projection row for one day, if computed.
    pub fn daily_attendance(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> HrResult<Option<DailyAttendance>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT emp_id, date, punch_in, punch_out, total_minutes, status
                 FROM daily_attendance WHERE emp_id = ?1 AND date = ?2",
                params![emp_id, date],
                map_daily,
            )
            .optional()?)
    }

    /// Stored projection rows for `from..=to`, earliest first.
    pub fn daily_attendance_between(
        &self,
        emp_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> HrResult<Vec<DailyAttendance>> {
        let mut stmt = self.conn().prepare(
            "SELECT emp_id, date, punch_in, punch_out, total_minutes, status
             FROM daily_attendance
             WHERE emp_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(params![emp_id, from, to], map_daily)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use crate::store::Store;
    use chrono::TimeZone;

    fn punch(hour: u32, minute: u32) -> PunchEvent {
        PunchEvent {
            emp_id: "EMP001".to_string(),
            instant: Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap(),
            device_id: "GATE-1".to_string(),
        }
    }

    #[test]
    fn test_duplicate_punch_is_conflict() {
        let store = Store::open_in_memory().unwrap();
        store.write(|tx| tx.insert_punch(&punch(5, 5))).unwrap();

        let result = store.write(|tx| tx.insert_punch(&punch(5, 5)));
        assert!(matches!(result, Err(HrError::DuplicatePunch { .. })));
    }

    #[test]
    fn test_punches_between_is_half_open_and_sorted() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.insert_punch(&punch(13, 40))?;
                tx.insert_punch(&punch(5, 5))?;
                tx.insert_punch(&punch(18, 30))
            })
            .unwrap();

        let from = Utc.with_ymd_and_hms(2026, 10, 19, 5, 5, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap();
        let found = store
            .read(|tx| tx.punches_between("EMP001", from, to))
            .unwrap();
        assert_eq!(found, vec![punch(5, 5), punch(13, 40)]);
    }

    #[test]
    fn test_daily_attendance_upsert_overwrites() {
        let store = Store::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let ist = FixedOffset::east_opt(19800).unwrap();
        let punch_in = ist.with_ymd_and_hms(2026, 10, 19, 10, 35, 0).unwrap();

        let mut day = DailyAttendance::absent("EMP001", date);
        store.write(|tx| tx.upsert_daily_attendance(&day)).unwrap();

        day.punch_in = Some(punch_in);
        day.status = AttendanceStatus::Working;
        store.write(|tx| tx.upsert_daily_attendance(&day)).unwrap();

        let rows = store
            .read(|tx| tx.daily_attendance_between("EMP001", date, date))
            .unwrap();
        assert_eq!(rows, vec![day]);
    }
}
