//! The attendance pipeline.
//!
//! Raw device records flow through three stages:
//!
//! 1. [`normalizer`]: device timestamp text to a canonical instant.
//! 2. [`ingest`]: instants stored as immutable [`PunchEvent`]s, one per
//!    employee and second.
//! 3. [`aggregator`]: punches classified into per-day rows
//!    ([`DailyAttendance`]) and summed into weekly and trailing views.
//!
//! [`PunchEvent`]: crate::models::PunchEvent
//! [`DailyAttendance`]: crate::models::DailyAttendance

pub mod aggregator;
pub mod daily;
pub mod ingest;
pub mod normalizer;
pub mod weekly;

pub use aggregator::{AttendanceAggregator, AttendanceSettings};
pub use daily::{ClassificationPolicy, classify_day, inactive_day};
pub use ingest::{DeviceFeed, EmployeeDay, IngestReport, PunchIngestor};
pub use normalizer::{DEVICE_TIMESTAMP_LAYOUT, day_start, local_to_utc, normalize, to_instant};
pub use weekly::{MAX_TRAILING_DAYS, dates_between, summarize_week, trailing_range, week_start};
