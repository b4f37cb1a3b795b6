//! The leave approval engine.
//!
//! A request moves through `Pending(level 1) -> Pending(level k) -> ...` and
//! ends `Approved` or `Rejected`:
//!
//! ```text
//!            apply
//!              |
//!              v
//!      +--> Pending(k) --reject--> Rejected
//!      |       |
//!      |    approve
//!      |       |
//!      +-- decider has supervisor?
//!   yes: k+1   |
//!              no
//!              v
//!           Approved (balance debited)
//! ```
//!
//! Every transition runs in one write transaction. Notifications are
//! collected while the transaction runs and handed to the dispatcher only
//! after it commits.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HrError, HrResult};
use crate::models::{
    Decision, Employee, LeaveApproval, LeaveBalance, LeaveRequest, LeaveStatus, Notification,
    ReportType,
};
use crate::notify::NotificationDispatcher;
use crate::store::{Store, Tx};

use super::ledger;

/// Default bound on approval levels per request.
pub const DEFAULT_MAX_APPROVAL_LEVELS: u32 = 10;

/// Escalation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Highest level a request may reach. Escalating past it fails.
    pub max_levels: u32,
    /// The reporting edge type followed when escalating.
    pub escalation_report_type: ReportType,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            max_levels: DEFAULT_MAX_APPROVAL_LEVELS,
            escalation_report_type: ReportType::Primary,
        }
    }
}

/// A leave application as submitted. Every field but `reason` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    /// The applicant.
    pub emp_id: Option<String>,
    /// The leave type.
    pub leave_type: Option<String>,
    /// First day of leave.
    pub start_date: Option<NaiveDate>,
    /// Last day of leave.
    pub end_date: Option<NaiveDate>,
    /// Days to charge; may be fractional.
    pub day_count: Option<Decimal>,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A validated application.
struct ValidApplication {
    emp_id: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    day_count: Decimal,
    reason: Option<String>,
}

impl LeaveApplication {
    fn validate(self) -> HrResult<ValidApplication> {
        let emp_id = required_text("emp_id", self.emp_id)?;
        let leave_type = required_text("leave_type", self.leave_type)?;
        let start_date = required("start_date", self.start_date)?;
        let end_date = required("end_date", self.end_date)?;
        let day_count = required("day_count", self.day_count)?;

        if end_date < start_date {
            return Err(HrError::validation("end_date", "must not be before start_date"));
        }
        if day_count <= Decimal::ZERO {
            return Err(HrError::validation("day_count", "must be positive"));
        }
        Ok(ValidApplication {
            emp_id,
            leave_type,
            start_date,
            end_date,
            day_count,
            reason: self.reason.filter(|r| !r.trim().is_empty()),
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> HrResult<T> {
    value.ok_or_else(|| HrError::validation(field, "is required"))
}

fn required_text(field: &str, value: Option<String>) -> HrResult<String> {
    let text = required(field, value)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(HrError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// A newly created request and its level-1 approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedLeave {
    /// The pending request.
    pub request: LeaveRequest,
    /// The level-1 approval assigned to the applicant's supervisor.
    pub approval: LeaveApproval,
}

/// What a decision did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// The request was rejected.
    Rejected {
        /// The request, now rejected.
        request: LeaveRequest,
        /// The decided approval.
        approval: LeaveApproval,
    },
    /// The decider approved and the request moved to the next level.
    Escalated {
        /// The request, still pending.
        request: LeaveRequest,
        /// The decided approval.
        approval: LeaveApproval,
        /// The new pending approval one level up.
        next: LeaveApproval,
    },
    /// The top of the chain approved; the balance was debited.
    Approved {
        /// The request, now approved.
        request: LeaveRequest,
        /// The decided approval.
        approval: LeaveApproval,
        /// The balance after the debit.
        balance: LeaveBalance,
    },
}

impl DecisionOutcome {
    /// The request after the decision.
    pub fn request(&self) -> &LeaveRequest {
        match self {
            DecisionOutcome::Rejected { request, .. }
            | DecisionOutcome::Escalated { request, .. }
            | DecisionOutcome::Approved { request, .. } => request,
        }
    }
}

type Outbox = Vec<(String, Notification)>;

/// Runs the leave approval workflow.
#[derive(Clone)]
pub struct LeaveEngine {
    pub(super) store: Store,
    dispatcher: NotificationDispatcher,
    policy: ApprovalPolicy,
    offset: FixedOffset,
}

impl LeaveEngine {
    /// Creates an engine. `offset` decides the calendar year a submission
    /// draws its balance from.
    pub fn new(
        store: Store,
        dispatcher: NotificationDispatcher,
        policy: ApprovalPolicy,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            dispatcher,
            policy,
            offset,
        }
    }

    /// The escalation rules in force.
    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// The balance year containing `now`.
    pub fn current_year(&self, now: DateTime<Utc>) -> i32 {
        now.with_timezone(&self.offset).year()
    }

    /// Submits a leave application.
    ///
    /// Creates the pending request and its level-1 approval, assigned to the
    /// applicant's supervisor, in one transaction. Fails without writing
    /// anything if the application is malformed, the balance is missing or
    /// short, or the applicant has no supervisor.
    pub fn apply(
        &self,
        application: LeaveApplication,
        now: DateTime<Utc>,
    ) -> HrResult<SubmittedLeave> {
        let app = application.validate()?;
        let year = self.current_year(now);

        let (submitted, outbox) = self.store.write(|tx| {
            require_employee(tx, &app.emp_id)?;
            match tx.leave_type(&app.leave_type)? {
                Some(leave_type) if leave_type.active => {}
                Some(_) => {
                    return Err(HrError::validation(
                        "leave_type",
                        format!("'{}' is not active", app.leave_type),
                    ));
                }
                None => {
                    return Err(HrError::validation(
                        "leave_type",
                        format!("'{}' is not a known leave type", app.leave_type),
                    ));
                }
            }

            let balance = ledger::get(tx, &app.emp_id, &app.leave_type, year)?;
            ledger::ensure_covers(&balance, app.day_count)?;

            let supervisor = tx
                .supervisor_edge(&app.emp_id, self.policy.escalation_report_type)?
                .ok_or_else(|| HrError::SupervisorNotFound {
                    emp_id: app.emp_id.clone(),
                })?;

            let mut request = LeaveRequest {
                id: 0,
                emp_id: app.emp_id.clone(),
                leave_type: app.leave_type.clone(),
                start_date: app.start_date,
                end_date: app.end_date,
                day_count: app.day_count,
                reason: app.reason.clone(),
                status: LeaveStatus::Pending,
                balance_year: year,
                submitted_at: now,
            };
            request.id = tx.insert_leave_request(&request)?;
            let approval = assign(tx, &request, &supervisor, 1, now)?;

            let outbox = vec![(
                approval.approver_emp_id.clone(),
                Notification::new_leave_request(&request, &approval),
            )];
            Ok((SubmittedLeave { request, approval }, outbox))
        })?;

        info!(
            leave_request_id = submitted.request.id,
            emp_id = %submitted.request.emp_id,
            approver = %submitted.approval.approver_emp_id,
            day_count = %submitted.request.day_count,
            "leave request submitted"
        );
        self.dispatcher.notify_all(&outbox);
        Ok(submitted)
    }

    /// Records a decision on a pending approval.
    ///
    /// The approval row is held exclusively for the whole transaction, so of
    /// two concurrent decisions on the same approval exactly one succeeds and
    /// the other fails with `AlreadyDecided`.
    pub fn decide(
        &self,
        approval_id: i64,
        decision: Decision,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) -> HrResult<DecisionOutcome> {
        let remarks = remarks.filter(|r| !r.trim().is_empty());

        let (outcome, outbox) = self.store.write(|tx| {
            let approval = tx.approval(approval_id)?.ok_or_else(|| HrError::NotFound {
                entity: "Leave approval",
                id: approval_id.to_string(),
            })?;
            if approval.status != LeaveStatus::Pending {
                return Err(already_decided(&approval));
            }
            let mut request = tx
                .leave_request(approval.leave_request_id)?
                .ok_or_else(|| {
                    HrError::internal(format!(
                        "approval {} references missing request {}",
                        approval.id, approval.leave_request_id
                    ))
                })?;
            if request.status.is_terminal() {
                return Err(HrError::internal(format!(
                    "request {} is {} but approval {} is pending",
                    request.id, request.status, approval.id
                )));
            }

            let status = LeaveStatus::from(decision);
            if tx.record_decision(approval.id, status, remarks.as_deref(), now)? != 1 {
                return Err(HrError::AlreadyDecided {
                    approval_id: approval.id,
                    status: "decided".to_string(),
                });
            }
            let decided = LeaveApproval {
                status,
                remarks: remarks.clone(),
                decided_at: Some(now),
                ..approval
            };

            match decision {
                Decision::Rejected => {
                    finish(tx, &mut request, LeaveStatus::Rejected)?;
                    let outbox = vec![(
                        request.emp_id.clone(),
                        Notification::leave_status_update(&request, &decided),
                    )];
                    Ok((
                        DecisionOutcome::Rejected {
                            request,
                            approval: decided,
                        },
                        outbox,
                    ))
                }
                Decision::Approved => self.approve(tx, request, decided, now),
            }
        })?;

        let request = outcome.request();
        info!(
            approval_id,
            leave_request_id = request.id,
            status = %request.status,
            outcome = outcome_label(&outcome),
            "leave decision recorded"
        );
        self.dispatcher.notify_all(&outbox);
        Ok(outcome)
    }

    fn approve(
        &self,
        tx: &Tx<'_>,
        mut request: LeaveRequest,
        decided: LeaveApproval,
        now: DateTime<Utc>,
    ) -> HrResult<(DecisionOutcome, Outbox)> {
        match tx.supervisor_edge(&decided.approver_emp_id, self.policy.escalation_report_type)? {
            Some(supervisor) => {
                if decided.level >= self.policy.max_levels {
                    return Err(HrError::internal(format!(
                        "request {} would exceed {} approval levels; check the reporting graph for a cycle",
                        request.id, self.policy.max_levels
                    )));
                }
                let next = assign(tx, &request, &supervisor, decided.level + 1, now)?;
                let outbox = vec![(
                    next.approver_emp_id.clone(),
                    Notification::new_leave_request(&request, &next),
                )];
                Ok((
                    DecisionOutcome::Escalated {
                        request,
                        approval: decided,
                        next,
                    },
                    outbox,
                ))
            }
            None => {
                finish(tx, &mut request, LeaveStatus::Approved)?;
                let balance = ledger::debit(
                    tx,
                    &request.emp_id,
                    &request.leave_type,
                    request.balance_year,
                    request.day_count,
                )?;
                let outbox = vec![(
                    request.emp_id.clone(),
                    Notification::leave_status_update(&request, &decided),
                )];
                Ok((
                    DecisionOutcome::Approved {
                        request,
                        approval: decided,
                        balance,
                    },
                    outbox,
                ))
            }
        }
    }
}

fn assign(
    tx: &Tx<'_>,
    request: &LeaveRequest,
    approver: &str,
    level: u32,
    now: DateTime<Utc>,
) -> HrResult<LeaveApproval> {
    let approver_role_label = require_employee(tx, approver)?.role.as_str().to_string();
    let mut approval = LeaveApproval {
        id: 0,
        leave_request_id: request.id,
        approver_emp_id: approver.to_string(),
        approver_role_label,
        level,
        status: LeaveStatus::Pending,
        remarks: None,
        decided_at: None,
        created_at: now,
    };
    approval.id = tx.insert_approval(&approval)?;
    Ok(approval)
}

fn finish(tx: &Tx<'_>, request: &mut LeaveRequest, status: LeaveStatus) -> HrResult<()> {
    if tx.finish_leave_request(request.id, status)? != 1 {
        return Err(HrError::internal(format!(
            "request {} was no longer pending",
            request.id
        )));
    }
    request.status = status;
    Ok(())
}

pub(super) fn require_employee(tx: &Tx<'_>, emp_id: &str) -> HrResult<Employee> {
    tx.employee(emp_id)?.ok_or_else(|| HrError::NotFound {
        entity: "Employee",
        id: emp_id.to_string(),
    })
}

fn already_decided(approval: &LeaveApproval) -> HrError {
    HrError::AlreadyDecided {
        approval_id: approval.id,
        status: approval.status.to_string(),
    }
}

fn outcome_label(outcome: &DecisionOutcome) -> &'static str {
    match outcome {
        DecisionOutcome::Rejected { .. } => "rejected",
        DecisionOutcome::Escalated { .. } => "escalated",
        DecisionOutcome::Approved { .. } => "approved",
    }
}
