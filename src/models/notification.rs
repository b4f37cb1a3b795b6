//! Notification payloads emitted on leave state changes.

use serde::{Deserialize, Serialize};

use super::{LeaveApproval, LeaveRequest, LeaveStatus};

/// The kind of state-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A pending decision was newly assigned to the recipient.
    NewLeaveRequest,
    /// The recipient's request was rejected or fully approved.
    LeaveStatusUpdate,
}

/// A message delivered to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind.
    pub kind: NotificationKind,
    /// The request concerned.
    pub leave_request_id: i64,
    /// The approval row concerned, if any.
    pub approval_id: Option<i64>,
    /// The approval level concerned, if any.
    pub level: Option<u32>,
    /// The request status after the transition.
    pub status: LeaveStatus,
    /// Human-readable summary.
    pub message: String,
}

impl Notification {
    /// Tells an approver that a decision now waits on them.
    pub fn new_leave_request(request: &LeaveRequest, approval: &LeaveApproval) -> Self {
        let message = if approval.level == 1 {
            format!(
                "{} applied for {} day(s) of {} leave",
                request.emp_id, request.day_count, request.leave_type
            )
        } else {
            format!(
                "{}'s {} leave request was escalated to you at level {}",
                request.emp_id, request.leave_type, approval.level
            )
        };
        Self {
            kind: NotificationKind::NewLeaveRequest,
            leave_request_id: request.id,
            approval_id: Some(approval.id),
            level: Some(approval.level),
            status: request.status,
            message,
        }
    }

    /// Tells an applicant their request reached a terminal status.
    pub fn leave_status_update(request: &LeaveRequest, approval: &LeaveApproval) -> Self {
        let message = match request.status {
            LeaveStatus::Approved => format!(
                "Your {} leave from {} to {} was fully approved",
                request.leave_type, request.start_date, request.end_date
            ),
            _ => format!(
                "Your {} leave from {} to {} was {} at level {}",
                request.leave_type,
                request.start_date,
                request.end_date,
                request.status,
                approval.level
            ),
        };
        Self {
            kind: NotificationKind::LeaveStatusUpdate,
            leave_request_id: request.id,
            approval_id: Some(approval.id),
            level: Some(approval.level),
            status: request.status,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::NewLeaveRequest).unwrap(),
            "\"NEW_LEAVE_REQUEST\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::LeaveStatusUpdate).unwrap(),
            "\"LEAVE_STATUS_UPDATE\""
        );
    }
}
