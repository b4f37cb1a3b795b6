//! Employee and reporting-graph models.
//!
//! Employees and their reporting edges are owned by the profile subsystem;
//! the core only reads them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// The role an employee holds in the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular employee.
    Employee,
    /// Line manager or other supervising role.
    Manager,
    /// HR / system administrator.
    Admin,
}

impl Role {
    /// Returns the stored text form of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// An employee as seen by the core.
///
/// # Example
///
/// ```
/// use hr_backoffice::models::{Employee, Role};
///
/// let employee = Employee {
///     emp_id: "EMP001".to_string(),
///     name: "Asha Rao".to_string(),
///     role: Role::Employee,
///     active: true,
///     device_user_id: Some("17".to_string()),
/// };
/// assert!(employee.active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Stable business key.
    pub emp_id: String,
    /// Display name.
    pub name: String,
    /// Organizational role.
    pub role: Role,
    /// Whether the employee is currently active.
    pub active: bool,
    /// The user identifier the biometric device reports for this employee.
    #[serde(default)]
    pub device_user_id: Option<String>,
}

/// The kind of a reporting relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// The line-management relationship used for escalation.
    Primary,
    /// A secondary manager.
    Secondary,
    /// A dotted-line relationship.
    Dotted,
}

impl ReportType {
    /// Returns the stored text form of the report type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Primary => "primary",
            ReportType::Secondary => "secondary",
            ReportType::Dotted => "dotted",
        }
    }
}

impl FromStr for ReportType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(ReportType::Primary),
            "secondary" => Ok(ReportType::Secondary),
            "dotted" => Ok(ReportType::Dotted),
            other => Err(UnknownVariant::new("report_type", other)),
        }
    }
}

/// A directed "reports to" edge in the organization graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingEdge {
    /// The reporting employee.
    pub emp_id: String,
    /// The supervisor.
    pub reports_to: String,
    /// The relationship kind.
    pub report_type: ReportType,
}

impl ReportingEdge {
    /// Creates a primary edge.
    pub fn primary(emp_id: impl Into<String>, reports_to: impl Into<String>) -> Self {
        Self {
            emp_id: emp_id.into(),
            reports_to: reports_to.into(),
            report_type: ReportType::Primary,
        }
    }
}
