//! Leave balances, requests and approval rows.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{HrError, HrResult};
use crate::models::{LeaveApproval, LeaveBalance, LeaveRequest, LeaveStatus};

use super::{Tx, is_constraint_violation, millis_column, parse_column, to_millis};

const REQUEST_COLUMNS: &str = "r.id, r.emp_id, r.leave_type, r.start_date, r.end_date, \
     r.day_count, r.reason, r.status, r.balance_year, r.submitted_at_ms";

const APPROVAL_COLUMNS: &str = "a.id, a.leave_request_id, a.approver_emp_id, \
     a.approver_role_label, a.level, a.status, a.remarks, a.decided_at_ms, a.created_at_ms";

fn map_balance(row: &Row<'_>) -> rusqlite::Result<LeaveBalance> {
    Ok(LeaveBalance {
        emp_id: row.get(0)?,
        leave_type: row.get(1)?,
        year: row.get(2)?,
        total: parse_column(row, 3)?,
        used: parse_column(row, 4)?,
        remaining: parse_column(row, 5)?,
    })
}

fn map_request_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<LeaveRequest> {
    Ok(LeaveRequest {
        id: row.get(offset)?,
        emp_id: row.get(offset + 1)?,
        leave_type: row.get(offset + 2)?,
        start_date: row.get(offset + 3)?,
        end_date: row.get(offset + 4)?,
        day_count: parse_column(row, offset + 5)?,
        reason: row.get(offset + 6)?,
        status: parse_column(row, offset + 7)?,
        balance_year: row.get(offset + 8)?,
        submitted_at: millis_column(row, offset + 9)?,
    })
}

fn map_approval_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<LeaveApproval> {
    let decided_at = match row.get::<_, Option<i64>>(offset + 7)? {
        Some(_) => Some(millis_column(row, offset + 7)?),
        None => None,
    };
    Ok(LeaveApproval {
        id: row.get(offset)?,
        leave_request_id: row.get(offset + 1)?,
        approver_emp_id: row.get(offset + 2)?,
        approver_role_label: row.get(offset + 3)?,
        level: row.get(offset + 4)?,
        status: parse_column(row, offset + 5)?,
        remarks: row.get(offset + 6)?,
        decided_at,
        created_at: millis_column(row, offset + 8)?,
    })
}

impl Tx<'_> {
    /// Creates a balance row for a new allotment.
    ///
    /// Fails with `Validation` if a row for the same key already exists.
    pub fn insert_balance(&self, balance: &LeaveBalance) -> HrResult<()> {
        if !balance.is_consistent() {
            return Err(HrError::validation(
                "remaining",
                "remaining must equal total - used",
            ));
        }
        let inserted = self.conn().execute(
            "INSERT INTO leave_balances (emp_id, leave_type, year, total, used, remaining)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                balance.emp_id,
                balance.leave_type,
                balance.year,
                balance.total.to_string(),
                balance.used.to_string(),
                balance.remaining.to_string()
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(HrError::validation(
                "leave_balance",
                format!(
                    "balance for {} / {} / {} already exists",
                    balance.emp_id, balance.leave_type, balance.year
                ),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Point lookup of one balance row.
    pub fn balance(
        &self,
        emp_id: &str,
        leave_type: &str,
        year: i32,
    ) -> HrResult<Option<LeaveBalance>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT emp_id, leave_type, year, total, used, remaining
                 FROM leave_balances
                 WHERE emp_id = ?1 AND leave_type = ?2 AND year = ?3",
                params![emp_id, leave_type, year],
                map_balance,
            )
            .optional()?)
    }

    /// All balance rows of an employee for a year, ordered by leave type.
    pub fn balances_for(&self, emp_id: &str, year: i32) -> HrResult<Vec<LeaveBalance>> {
        let mut stmt = self.conn().prepare(
            "SELECT emp_id, leave_type, year, total, used, remaining
             FROM leave_balances WHERE emp_id = ?1 AND year = ?2
             ORDER BY leave_type",
        )?;
        let rows = stmt.query_map(params![emp_id, year], map_balance)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Writes back `used`/`remaining` of an existing balance row.
    pub(crate) fn update_balance_usage(&self, balance: &LeaveBalance) -> HrResult<usize> {
        Ok(self.conn().execute(
            "UPDATE leave_balances SET used = ?4, remaining = ?5
             WHERE emp_id = ?1 AND leave_type = ?2 AND year = ?3",
            params![
                balance.emp_id,
                balance.leave_type,
                balance.year,
                balance.used.to_string(),
                balance.remaining.to_string()
            ],
        )?)
    }

    /// Inserts a leave request and returns its id. `request.id` is ignored.
    pub(crate) fn insert_leave_request(&self, request: &LeaveRequest) -> HrResult<i64> {
        self.conn().execute(
            "INSERT INTO leave_requests
             (emp_id, leave_type, start_date, end_date, day_count, reason, status,
              balance_year, submitted_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                request.emp_id,
                request.leave_type,
                request.start_date,
                request.end_date,
                request.day_count.to_string(),
                request.reason,
                request.status.as_str(),
                request.balance_year,
                to_millis(request.submitted_at)
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Point lookup of a leave request.
    pub fn leave_request(&self, id: i64) -> HrResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests r WHERE r.id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id], |r| map_request_at(r, 0))
            .optional()?)
    }

    /// Moves a pending request to a terminal status. Returns rows changed.
    pub(crate) fn finish_leave_request(&self, id: i64, status: LeaveStatus) -> HrResult<usize> {
        Ok(self.conn().execute(
            "UPDATE leave_requests SET status = ?2 WHERE id = ?1 AND status = 'pending'",
            params![id, status.as_str()],
        )?)
    }

    /// An employee's requests, newest first.
    pub fn leave_requests_for(&self, emp_id: &str) -> HrResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests r
             WHERE r.emp_id = ?1 ORDER BY r.submitted_at_ms DESC, r.id DESC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![emp_id], |r| map_request_at(r, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of pending requests per leave type for an employee and year.
    pub fn pending_request_counts(
        &self,
        emp_id: &str,
        year: i32,
    ) -> HrResult<Vec<(String, u32)>> {
        let mut stmt = self.conn().prepare(
            "SELECT leave_type, COUNT(*) FROM leave_requests
             WHERE emp_id = ?1 AND balance_year = ?2 AND status = 'pending'
             GROUP BY leave_type ORDER BY leave_type",
        )?;
        let rows = stmt.query_map(params![emp_id, year], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inserts an approval row and returns its id. `approval.id` is ignored.
    pub(crate) fn insert_approval(&self, approval: &LeaveApproval) -> HrResult<i64> {
        self.conn().execute(
            "INSERT INTO leave_approvals
             (leave_request_id, approver_emp_id, approver_role_label, level, status,
              remarks, decided_at_ms, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                approval.leave_request_id,
                approval.approver_emp_id,
                approval.approver_role_label,
                approval.level,
                approval.status.as_str(),
                approval.remarks,
                approval.decided_at.map(to_millis),
                to_millis(approval.created_at)
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Point lookup of an approval row.
    ///
    /// Inside a [`Store::write`](super::Store::write) transaction the row is
    /// held exclusively until commit or rollback.
    pub fn approval(&self, id: i64) -> HrResult<Option<LeaveApproval>> {
        let sql = format!("SELECT {APPROVAL_COLUMNS} FROM leave_approvals a WHERE a.id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id], |r| map_approval_at(r, 0))
            .optional()?)
    }

    /// Records a decision on a pending approval. Returns rows changed.
    pub(crate) fn record_decision(
        &self,
        id: i64,
        status: LeaveStatus,
        remarks: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> HrResult<usize> {
        Ok(self.conn().execute(
            "UPDATE leave_approvals SET status = ?2, remarks = ?3, decided_at_ms = ?4
             WHERE id = ?1 AND status = 'pending'",
            params![id, status.as_str(), remarks, to_millis(decided_at)],
        )?)
    }

    /// The approval chain of a request, level 1 first.
    pub fn approvals_for_request(&self, leave_request_id: i64) -> HrResult<Vec<LeaveApproval>> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM leave_approvals a
             WHERE a.leave_request_id = ?1 ORDER BY a.level"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![leave_request_id], |r| map_approval_at(r, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending approvals assigned to an approver, oldest submission first.
    pub fn pending_approvals_for(
        &self,
        approver_emp_id: &str,
    ) -> HrResult<Vec<(LeaveApproval, LeaveRequest)>> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS}, {REQUEST_COLUMNS}
             FROM leave_approvals a
             JOIN leave_requests r ON r.id = a.leave_request_id
             WHERE a.approver_emp_id = ?1 AND a.status = 'pending'
             ORDER BY r.submitted_at_ms ASC, r.id ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![approver_emp_id], |r| {
            Ok((map_approval_at(r, 0)?, map_request_at(r, 9)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    fn request(emp_id: &str, submitted_at: DateTime<Utc>) -> LeaveRequest {
        LeaveRequest {
            id: 0,
            emp_id: emp_id.to_string(),
            leave_type: "casual".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 26).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 27).unwrap(),
            day_count: Decimal::new(2, 0),
            reason: Some("family function".to_string()),
            status: LeaveStatus::Pending,
            balance_year: 2026,
            submitted_at,
        }
    }

    fn approval(leave_request_id: i64, approver: &str, level: u32) -> LeaveApproval {
        LeaveApproval {
            id: 0,
            leave_request_id,
            approver_emp_id: approver.to_string(),
            approver_role_label: "manager".to_string(),
            level,
            status: LeaveStatus::Pending,
            remarks: None,
            decided_at: None,
            created_at: at(9),
        }
    }

    #[test]
    fn test_balance_roundtrip_preserves_decimals() {
        let store = Store::open_in_memory().unwrap();
        let balance = LeaveBalance::allot("EMP001", "sick", 2026, Decimal::new(75, 1));
        store.write(|tx| tx.insert_balance(&balance)).unwrap();

        let found = store
            .read(|tx| tx.balance("EMP001", "sick", 2026))
            .unwrap()
            .unwrap();
        assert_eq!(found, balance);
    }

    #[test]
    fn test_duplicate_balance_is_validation_error() {
        let store = Store::open_in_memory().unwrap();
        let balance = LeaveBalance::allot("EMP001", "sick", 2026, Decimal::new(7, 0));
        store.write(|tx| tx.insert_balance(&balance)).unwrap();

        let result = store.write(|tx| tx.insert_balance(&balance));
        assert!(matches!(result, Err(HrError::Validation { .. })));
    }

    #[test]
    fn test_inconsistent_balance_rejected() {
        let store = Store::open_in_memory().unwrap();
        let mut balance = LeaveBalance::allot("EMP001", "sick", 2026, Decimal::new(7, 0));
        balance.used = Decimal::ONE;
        let result = store.write(|tx| tx.insert_balance(&balance));
        assert!(matches!(result, Err(HrError::Validation { .. })));
    }

    #[test]
    fn test_request_and_approval_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let (request_id, approval_id) = store
            .write(|tx| {
                let request_id = tx.insert_leave_request(&request("EMP001", at(8)))?;
                let approval_id = tx.insert_approval(&approval(request_id, "MGR001", 1))?;
                Ok((request_id, approval_id))
            })
            .unwrap();

        let stored = store.read(|tx| tx.leave_request(request_id)).unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Pending);
        assert_eq!(stored.submitted_at, at(8));

        let level = store.read(|tx| tx.approval(approval_id)).unwrap().unwrap();
        assert_eq!(level.level, 1);
        assert_eq!(level.decided_at, None);
    }

    #[test]
    fn test_record_decision_only_touches_pending_rows() {
        let store = Store::open_in_memory().unwrap();
        let approval_id = store
            .write(|tx| {
                let request_id = tx.insert_leave_request(&request("EMP001", at(8)))?;
                tx.insert_approval(&approval(request_id, "MGR001", 1))
            })
            .unwrap();

        let first = store
            .write(|tx| tx.record_decision(approval_id, LeaveStatus::Approved, Some("ok"), at(10)))
            .unwrap();
        let second = store
            .write(|tx| tx.record_decision(approval_id, LeaveStatus::Rejected, None, at(11)))
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);

        let level = store.read(|tx| tx.approval(approval_id)).unwrap().unwrap();
        assert_eq!(level.status, LeaveStatus::Approved);
        assert_eq!(level.remarks.as_deref(), Some("ok"));
        assert_eq!(level.decided_at, Some(at(10)));
    }

    #[test]
    fn test_second_pending_row_for_request_is_refused() {
        let store = Store::open_in_memory().unwrap();
        let result = store.write(|tx| {
            let request_id = tx.insert_leave_request(&request("EMP001", at(8)))?;
            tx.insert_approval(&approval(request_id, "MGR001", 1))?;
            tx.insert_approval(&approval(request_id, "DIR001", 2))
        });
        assert!(matches!(result, Err(HrError::Internal { .. })));
    }

    #[test]
    fn test_pending_queue_is_oldest_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                let newer = tx.insert_leave_request(&request("EMP002", at(12)))?;
                tx.insert_approval(&approval(newer, "MGR001", 1))?;
                let older = tx.insert_leave_request(&request("EMP001", at(8)))?;
                tx.insert_approval(&approval(older, "MGR001", 1))?;
                Ok(())
            })
            .unwrap();

        let queue = store.read(|tx| tx.pending_approvals_for("MGR001")).unwrap();
        let applicants: Vec<_> = queue.iter().map(|(_, r)| r.emp_id.as_str()).collect();
        assert_eq!(applicants, vec!["EMP001", "EMP002"]);
    }

    #[test]
    fn test_pending_request_counts_group_by_type() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.insert_leave_request(&request("EMP001", at(8)))?;
                tx.insert_leave_request(&request("EMP001", at(9)))?;
                let done = tx.insert_leave_request(&request("EMP001", at(10)))?;
                tx.finish_leave_request(done, LeaveStatus::Rejected)?;
                Ok(())
            })
            .unwrap();

        let counts = store
            .read(|tx| tx.pending_request_counts("EMP001", 2026))
            .unwrap();
        assert_eq!(counts, vec![("casual".to_string(), 2)]);
    }
}
