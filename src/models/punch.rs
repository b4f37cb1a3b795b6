//! Biometric punch models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw record as produced by the device feed, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunchRecord {
    /// The device-local user identifier.
    pub device_user_id: String,
    /// Timestamp text in the device layout, e.g.
    /// `Mon Oct 19 2026 10:35:00 GMT+0530 (India Standard Time)`.
    pub timestamp: String,
    /// The device that captured the punch.
    pub device_id: String,
}

/// A recorded punch. Immutable once stored; unique per `(emp_id, instant)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvent {
    /// The employee who punched.
    pub emp_id: String,
    /// The canonical instant of the punch.
    pub instant: DateTime<Utc>,
    /// The device that captured the punch.
    pub device_id: String,
}
