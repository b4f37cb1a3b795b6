//! Request types for the HR back-office API.
//!
//! Leave submissions deserialize straight into
//! [`LeaveApplication`](crate::leave::LeaveApplication); the remaining bodies
//! and query strings are defined here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Decision, RawPunchRecord, WeeklyMode};

/// Body of `POST /leave/approvals/:id/decision`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// `approved` or `rejected`.
    pub decision: Decision,
    /// Optional note from the approver.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Body of `POST /attendance/:emp_id/recompute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecomputeRequest {
    /// The local day to recompute; today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Body of `POST /punches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchBatch {
    /// Raw device records, in feed order.
    pub records: Vec<RawPunchRecord>,
}

/// Query of `GET /leave/balances/:emp_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceQuery {
    /// Balance year; the current local year when absent.
    pub year: Option<i32>,
}

/// Query of `GET /attendance/:emp_id/week`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekQuery {
    /// Overrides the configured weekly mode.
    pub mode: Option<WeeklyMode>,
}

/// Query of `GET /attendance/:emp_id/window`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    /// Window length in days.
    pub days: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_decision_without_remarks() {
        let request: DecisionRequest = serde_json::from_str(r#"{"decision": "rejected"}"#).unwrap();
        assert_eq!(request.decision, Decision::Rejected);
        assert!(request.remarks.is_none());
    }

    #[test]
    fn test_unknown_decision_is_rejected() {
        let result: Result<DecisionRequest, _> =
            serde_json::from_str(r#"{"decision": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_punch_batch() {
        let json = r#"{
            "records": [
                {
                    "device_user_id": "17",
                    "timestamp": "Mon Oct 19 2026 10:35:00 GMT+0530 (India Standard Time)",
                    "device_id": "gate-1"
                }
            ]
        }"#;

        let batch: PunchBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].device_user_id, "17");
    }

    #[test]
    fn test_recompute_date_is_optional() {
        let request: RecomputeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.date.is_none());

        let request: RecomputeRequest = serde_json::from_str(r#"{"date": "2026-10-19"}"#).unwrap();
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2026, 10, 19));
    }
}
