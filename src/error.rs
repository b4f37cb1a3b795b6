//! Error types for the HR back-office core.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the core can report. Each variant belongs to exactly one
//! kind of the public error taxonomy, exposed through [`HrError::code`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the HR back-office core.
///
/// # Example
///
/// ```
/// use hr_backoffice::error::HrError;
///
/// let error = HrError::SupervisorNotFound {
///     emp_id: "EMP001".to_string(),
/// };
/// assert_eq!(error.to_string(), "No supervisor found for employee 'EMP001'");
/// assert_eq!(error.code(), "NOT_FOUND");
/// ```
#[derive(Debug, Error)]
pub enum HrError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Input was missing or malformed.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind, e.g. "Leave approval".
        entity: &'static str,
        /// The key that was looked up.
        id: String,
    },

    /// The reporting graph has no escalation supervisor for the employee.
    #[error("No supervisor found for employee '{emp_id}'")]
    SupervisorNotFound {
        /// The employee whose supervisor was requested.
        emp_id: String,
    },

    /// No balance row exists for the employee, leave type and year.
    #[error("No '{leave_type}' balance for employee '{emp_id}' in {year}")]
    BalanceNotFound {
        /// The employee.
        emp_id: String,
        /// The leave type.
        leave_type: String,
        /// The balance year.
        year: i32,
    },

    /// The remaining balance does not cover the requested days.
    #[error(
        "Insufficient '{leave_type}' balance for employee '{emp_id}': requested {requested}, remaining {remaining}"
    )]
    InsufficientBalance {
        /// The employee.
        emp_id: String,
        /// The leave type.
        leave_type: String,
        /// Days requested.
        requested: Decimal,
        /// Days remaining.
        remaining: Decimal,
    },

    /// The approval has already reached a terminal status.
    #[error("Leave approval {approval_id} was already decided ({status})")]
    AlreadyDecided {
        /// The approval that was targeted.
        approval_id: i64,
        /// Its current status.
        status: String,
    },

    /// A punch with the same employee and instant is already recorded.
    #[error("Duplicate punch for employee '{emp_id}' at {instant}")]
    DuplicatePunch {
        /// The employee.
        emp_id: String,
        /// The duplicated instant.
        instant: DateTime<Utc>,
    },

    /// A collaborator (device feed, notification channel) could not be reached.
    #[error("Upstream '{service}' unavailable: {message}")]
    UpstreamUnavailable {
        /// The collaborator name.
        service: String,
        /// Transport detail.
        message: String,
    },

    /// Unexpected persistence or invariant failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Detail for logs; never returned to API callers.
        message: String,
    },
}

impl HrError {
    /// Builds a validation error for a field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        HrError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        HrError::Internal {
            message: message.into(),
        }
    }

    /// Returns the stable taxonomy code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            HrError::ConfigNotFound { .. } | HrError::ConfigParseError { .. } => "CONFIG_ERROR",
            HrError::Validation { .. } => "VALIDATION_ERROR",
            HrError::NotFound { .. } | HrError::SupervisorNotFound { .. } => "NOT_FOUND",
            HrError::BalanceNotFound { .. } => "BALANCE_NOT_FOUND",
            HrError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            HrError::AlreadyDecided { .. } | HrError::DuplicatePunch { .. } => "CONFLICT",
            HrError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            HrError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<rusqlite::Error> for HrError {
    fn from(err: rusqlite::Error) -> Self {
        HrError::Internal {
            message: format!("record store: {}", err),
        }
    }
}

/// A type alias for Results that return HrError.
pub type HrResult<T> = Result<T, HrError>;
