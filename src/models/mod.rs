//! Core data models for the HR back-office core.
//!
//! This module contains the domain types shared by the record store, the
//! attendance pipeline, the leave workflow and the HTTP API.

mod attendance;
mod employee;
mod leave;
mod notification;
mod punch;

pub use attendance::{
    AttendanceStatus, DailyAttendance, WeeklyAttendance, WeeklyMode, WorkedDuration,
};
pub use employee::{Employee, ReportType, ReportingEdge, Role};
pub use leave::{Decision, LeaveApproval, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
pub use notification::{Notification, NotificationKind};
pub use punch::{PunchEvent, RawPunchRecord};

/// Text that does not name any variant of a stored enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
