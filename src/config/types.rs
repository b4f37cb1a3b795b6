//! Configuration types for the HR back-office service.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files of a configuration directory.

use chrono::NaiveTime;
use serde::Deserialize;

use crate::leave::DEFAULT_MAX_APPROVAL_LEVELS;
use crate::models::{ReportType, WeeklyMode};

fn default_database_path() -> String {
    crate::store::IN_MEMORY.to_string()
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_trailing_days() -> u32 {
    30
}

fn default_max_approval_levels() -> u32 {
    DEFAULT_MAX_APPROVAL_LEVELS
}

/// Process-level settings (`service.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds, e.g. "0.0.0.0:8080".
    pub bind_address: String,
    /// SQLite database file, or ":memory:".
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Offset of the service timezone from UTC, in minutes.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Period of the background recompute of today's attendance, if enabled.
    #[serde(default)]
    pub recompute_interval_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            database_path: default_database_path(),
            utc_offset_minutes: default_utc_offset_minutes(),
            recompute_interval_secs: None,
        }
    }
}

/// The daily classification policy named in `attendance.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Disjoint punch-in and punch-out windows.
    OfficeHours,
    /// Earliest and latest punch of the day.
    FreePunch,
}

/// Attendance settings (`attendance.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendanceConfig {
    /// Which classification policy to use.
    pub policy: PolicyKind,
    /// Start of the punch-in window; required for `office_hours`.
    #[serde(default)]
    pub punch_in_window_start: Option<NaiveTime>,
    /// Start of the punch-out window; required for `office_hours`.
    #[serde(default)]
    pub punch_out_window_start: Option<NaiveTime>,
    /// How weekly totals treat today's open session.
    #[serde(default)]
    pub weekly_mode: WeeklyMode,
    /// Trailing window length used when a query names none.
    #[serde(default = "default_trailing_days")]
    pub default_trailing_days: u32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::OfficeHours,
            punch_in_window_start: NaiveTime::from_hms_opt(10, 30, 0),
            punch_out_window_start: NaiveTime::from_hms_opt(19, 0, 0),
            weekly_mode: WeeklyMode::Settled,
            default_trailing_days: default_trailing_days(),
        }
    }
}

/// Leave workflow settings (`leave.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaveConfig {
    /// Highest approval level a request may reach.
    #[serde(default = "default_max_approval_levels")]
    pub max_approval_levels: u32,
    /// Reporting edge type followed when escalating.
    #[serde(default = "default_report_type")]
    pub escalation_report_type: ReportType,
}

fn default_report_type() -> ReportType {
    ReportType::Primary
}

impl Default for LeaveConfig {
    fn default() -> Self {
        Self {
            max_approval_levels: default_max_approval_levels(),
            escalation_report_type: default_report_type(),
        }
    }
}

/// The full service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HrConfig {
    /// `service.yaml`.
    pub service: ServiceConfig,
    /// `attendance.yaml`.
    pub attendance: AttendanceConfig,
    /// `leave.yaml`.
    pub leave: LeaveConfig,
}
