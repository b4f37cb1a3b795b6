//! Leave catalog, balance, request and approval models.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// A leave type from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    /// Catalog name, e.g. "casual".
    pub name: String,
    /// Whether new requests may use this type.
    pub active: bool,
}

/// Allotment and usage of one leave type for one employee and year.
///
/// `remaining == total - used` holds for every row.
///
/// # Example
///
/// ```
/// use hr_backoffice::models::LeaveBalance;
/// use rust_decimal::Decimal;
///
/// let balance = LeaveBalance::allot("EMP001", "casual", 2026, Decimal::new(12, 0));
/// assert_eq!(balance.remaining, Decimal::new(12, 0));
/// assert!(balance.is_consistent());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The employee.
    pub emp_id: String,
    /// The leave type.
    pub leave_type: String,
    /// The calendar year bucket.
    pub year: i32,
    /// Days allotted.
    pub total: Decimal,
    /// Days consumed by approved requests.
    pub used: Decimal,
    /// Days still available.
    pub remaining: Decimal,
}

impl LeaveBalance {
    /// A fresh allotment with nothing used.
    pub fn allot(
        emp_id: impl Into<String>,
        leave_type: impl Into<String>,
        year: i32,
        total: Decimal,
    ) -> Self {
        Self {
            emp_id: emp_id.into(),
            leave_type: leave_type.into(),
            year,
            total,
            used: Decimal::ZERO,
            remaining: total,
        }
    }

    /// Whether the row satisfies `remaining == total - used`.
    pub fn is_consistent(&self) -> bool {
        self.remaining == self.total - self.used
    }
}

/// Status shared by leave requests and approval rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved (terminal).
    Approved,
    /// Rejected (terminal).
    Rejected,
}

impl LeaveStatus {
    /// Returns the stored text form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }

    /// Whether no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            other => Err(UnknownVariant::new("leave status", other)),
        }
    }
}

/// The outcome an approver records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Approve at this level.
    Approved,
    /// Reject the whole request.
    Rejected,
}

impl From<Decision> for LeaveStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => LeaveStatus::Approved,
            Decision::Rejected => LeaveStatus::Rejected,
        }
    }
}

/// A submitted leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Store-assigned identifier.
    pub id: i64,
    /// The applicant.
    pub emp_id: String,
    /// The leave type.
    pub leave_type: String,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Days charged against the balance.
    pub day_count: Decimal,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Current status.
    pub status: LeaveStatus,
    /// The balance year the request draws on.
    pub balance_year: i32,
    /// When the request was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// One level of the approval chain of a leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApproval {
    /// Store-assigned identifier.
    pub id: i64,
    /// The request being decided.
    pub leave_request_id: i64,
    /// The employee who must decide.
    pub approver_emp_id: String,
    /// The approver's role at assignment time.
    pub approver_role_label: String,
    /// Position in the chain, starting at 1.
    pub level: u32,
    /// Decision status of this level.
    pub status: LeaveStatus,
    /// Approver remarks.
    pub remarks: Option<String>,
    /// When the decision was recorded.
    pub decided_at: Option<DateTime<Utc>>,
    /// When this level was assigned.
    pub created_at: DateTime<Utc>,
}
