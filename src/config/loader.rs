//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the service
//! configuration from a directory of YAML files.

use chrono::FixedOffset;
use std::fs;
use std::path::Path;

use crate::attendance::{AttendanceSettings, ClassificationPolicy, MAX_TRAILING_DAYS};
use crate::error::{HrError, HrResult};
use crate::leave::ApprovalPolicy;

use super::types::{AttendanceConfig, HrConfig, LeaveConfig, PolicyKind, ServiceConfig};

const SERVICE_FILE: &str = "service.yaml";
const ATTENDANCE_FILE: &str = "attendance.yaml";
const LEAVE_FILE: &str = "leave.yaml";

/// Largest offset any real timezone uses, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Loads, validates and resolves the service configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── service.yaml     # bind address, database path, timezone offset
/// ├── attendance.yaml  # classification policy and window boundaries
/// └── leave.yaml       # approval level bound, escalation edge type
/// ```
///
/// # Example
///
/// ```no_run
/// use hr_backoffice::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Listening on {}", loader.service().bind_address);
/// println!("Attendance policy: {:?}", loader.attendance_settings().policy);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: HrConfig,
    offset: FixedOffset,
    policy: ClassificationPolicy,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns `ConfigNotFound` if a file is missing and `ConfigParseError`
    /// if a file is not valid YAML or holds inconsistent settings.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hr_backoffice::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), hr_backoffice::error::HrError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> HrResult<Self> {
        let path = path.as_ref();

        let service_path = path.join(SERVICE_FILE);
        let service = Self::load_yaml::<ServiceConfig>(&service_path)?;

        let attendance_path = path.join(ATTENDANCE_FILE);
        let attendance = Self::load_yaml::<AttendanceConfig>(&attendance_path)?;

        let leave_path = path.join(LEAVE_FILE);
        let leave = Self::load_yaml::<LeaveConfig>(&leave_path)?;

        let config = HrConfig {
            service,
            attendance,
            leave,
        };
        Self::resolve(config, path)
    }

    /// Validates an already-built configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_backoffice::config::{ConfigLoader, HrConfig};
    ///
    /// let loader = ConfigLoader::from_config(HrConfig::default())?;
    /// assert_eq!(loader.utc_offset().local_minus_utc(), 19800);
    /// # Ok::<(), hr_backoffice::error::HrError>(())
    /// ```
    pub fn from_config(config: HrConfig) -> HrResult<Self> {
        Self::resolve(config, Path::new(""))
    }

    fn resolve(config: HrConfig, dir: &Path) -> HrResult<Self> {
        let invalid = |file: &str, message: String| HrError::ConfigParseError {
            path: dir.join(file).display().to_string(),
            message,
        };

        let minutes = config.service.utc_offset_minutes;
        let offset = if minutes.abs() <= MAX_OFFSET_MINUTES {
            FixedOffset::east_opt(minutes * 60)
        } else {
            None
        }
        .ok_or_else(|| {
            invalid(
                SERVICE_FILE,
                format!("utc_offset_minutes {} is outside +/-{}", minutes, MAX_OFFSET_MINUTES),
            )
        })?;

        let attendance = &config.attendance;
        let policy = match attendance.policy {
            PolicyKind::FreePunch => ClassificationPolicy::FreePunch,
            PolicyKind::OfficeHours => {
                match (attendance.punch_in_window_start, attendance.punch_out_window_start) {
                    (Some(punch_in_from), Some(punch_out_from)) if punch_in_from < punch_out_from => {
                        ClassificationPolicy::OfficeHours {
                            punch_in_from,
                            punch_out_from,
                        }
                    }
                    (Some(_), Some(_)) => {
                        return Err(invalid(
                            ATTENDANCE_FILE,
                            "punch_in_window_start must be before punch_out_window_start"
                                .to_string(),
                        ));
                    }
                    _ => {
                        return Err(invalid(
                            ATTENDANCE_FILE,
                            "office_hours needs punch_in_window_start and punch_out_window_start"
                                .to_string(),
                        ));
                    }
                }
            }
        };

        if attendance.default_trailing_days == 0
            || attendance.default_trailing_days > MAX_TRAILING_DAYS
        {
            return Err(invalid(
                ATTENDANCE_FILE,
                format!("default_trailing_days must be between 1 and {}", MAX_TRAILING_DAYS),
            ));
        }

        if config.leave.max_approval_levels == 0 {
            return Err(invalid(
                LEAVE_FILE,
                "max_approval_levels must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            offset,
            policy,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> HrResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| HrError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| HrError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &HrConfig {
        &self.config
    }

    /// Returns the process-level settings.
    pub fn service(&self) -> &ServiceConfig {
        &self.config.service
    }

    /// The service timezone.
    pub fn utc_offset(&self) -> FixedOffset {
        self.offset
    }

    /// The resolved daily classification policy.
    pub fn classification_policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Settings for the attendance aggregator.
    pub fn attendance_settings(&self) -> AttendanceSettings {
        AttendanceSettings {
            policy: self.policy,
            offset: self.offset,
            weekly_mode: self.config.attendance.weekly_mode,
        }
    }

    /// Trailing window length used when a query names none.
    pub fn default_trailing_days(&self) -> u32 {
        self.config.attendance.default_trailing_days
    }

    /// Escalation rules for the leave engine.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy {
            max_levels: self.config.leave.max_approval_levels,
            escalation_report_type: self.config.leave.escalation_report_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportType, WeeklyMode};
    use chrono::NaiveTime;
    use std::path::PathBuf;

    fn config_path() -> &'static str {
        "./config/default"
    }

    /// A scratch directory holding the given files.
    fn scratch_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hr-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    const SERVICE: &str = "bind_address: \"127.0.0.1:0\"\n";
    const LEAVE: &str = "max_approval_levels: 4\n";

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.service().bind_address, "0.0.0.0:8080");
        assert_eq!(loader.utc_offset().local_minus_utc(), 330 * 60);
        assert_eq!(
            loader.classification_policy(),
            ClassificationPolicy::OfficeHours {
                punch_in_from: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                punch_out_from: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            }
        );
        assert_eq!(loader.default_trailing_days(), 30);
        assert_eq!(loader.approval_policy(), ApprovalPolicy::default());
    }

    #[test]
    fn test_load_missing_directory_is_config_not_found() {
        let result = ConfigLoader::load("./config/does-not-exist");
        match result {
            Err(HrError::ConfigNotFound { path }) => assert!(path.ends_with(SERVICE_FILE)),
            other => panic!("Expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_free_punch_needs_no_windows() {
        let dir = scratch_dir(&[
            (SERVICE_FILE, SERVICE),
            (ATTENDANCE_FILE, "policy: free_punch\nweekly_mode: as_of_now\n"),
            (LEAVE_FILE, LEAVE),
        ]);
        let loader = ConfigLoader::load(&dir).unwrap();

        assert_eq!(loader.classification_policy(), ClassificationPolicy::FreePunch);
        assert_eq!(loader.attendance_settings().weekly_mode, WeeklyMode::AsOfNow);
        assert_eq!(loader.service().database_path, ":memory:");
        assert_eq!(loader.approval_policy().max_levels, 4);
        assert_eq!(
            loader.approval_policy().escalation_report_type,
            ReportType::Primary
        );
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_office_hours_without_boundaries_is_parse_error() {
        let dir = scratch_dir(&[
            (SERVICE_FILE, SERVICE),
            (ATTENDANCE_FILE, "policy: office_hours\npunch_in_window_start: \"10:30:00\"\n"),
            (LEAVE_FILE, LEAVE),
        ]);
        let result = ConfigLoader::load(&dir);
        match result {
            Err(HrError::ConfigParseError { path, .. }) => assert!(path.ends_with(ATTENDANCE_FILE)),
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let dir = scratch_dir(&[
            (SERVICE_FILE, SERVICE),
            (ATTENDANCE_FILE, "policy: [unclosed\n"),
            (LEAVE_FILE, LEAVE),
        ]);
        assert!(matches!(
            ConfigLoader::load(&dir),
            Err(HrError::ConfigParseError { .. })
        ));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_reversed_windows_rejected() {
        let mut config = HrConfig::default();
        config.attendance.punch_in_window_start = NaiveTime::from_hms_opt(19, 0, 0);
        config.attendance.punch_out_window_start = NaiveTime::from_hms_opt(10, 30, 0);
        assert!(ConfigLoader::from_config(config).is_err());
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let mut config = HrConfig::default();
        config.service.utc_offset_minutes = 15 * 60;
        assert!(ConfigLoader::from_config(config).is_err());
    }

    #[test]
    fn test_zero_levels_rejected() {
        let mut config = HrConfig::default();
        config.leave.max_approval_levels = 0;
        assert!(ConfigLoader::from_config(config).is_err());
    }

    #[test]
    fn test_trailing_days_bounds() {
        let mut config = HrConfig::default();
        config.attendance.default_trailing_days = MAX_TRAILING_DAYS + 1;
        assert!(ConfigLoader::from_config(config).is_err());
    }
}
