//! Configuration loading and management for the HR back-office service.
//!
//! This module loads the service configuration from a directory of YAML
//! files and resolves it into the settings the attendance pipeline and the
//! leave engine run with.
//!
//! # Example
//!
//! ```no_run
//! use hr_backoffice::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Database: {}", config.service().database_path);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AttendanceConfig, HrConfig, LeaveConfig, PolicyKind, ServiceConfig};
