//! Read-only leave views.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::HrResult;
use crate::models::{LeaveApproval, LeaveRequest, ReportType};

use super::engine::{LeaveEngine, require_employee};
use super::reporting::ReportingGraph;

/// One leave type's line in a balance summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceLine {
    /// The leave type.
    pub leave_type: String,
    /// Days allotted.
    pub total: Decimal,
    /// Days used by approved requests.
    pub used: Decimal,
    /// Days available.
    pub remaining: Decimal,
    /// Requests of this type still awaiting a decision.
    pub pending_requests: u32,
}

/// An employee's balances for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    /// The employee.
    pub emp_id: String,
    /// The balance year.
    pub year: i32,
    /// One line per allotted leave type, ordered by type.
    pub balances: Vec<BalanceLine>,
}

/// A request with every approval level recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestHistory {
    /// The request.
    pub request: LeaveRequest,
    /// Approval rows, level 1 first.
    pub approvals: Vec<LeaveApproval>,
}

/// A pending approval in an approver's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingApproval {
    /// The approval awaiting a decision.
    pub approval: LeaveApproval,
    /// The request it belongs to.
    pub request: LeaveRequest,
}

/// The approvers a new request from an employee would pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportingChain {
    /// The employee.
    pub emp_id: String,
    /// The edge type followed.
    pub report_type: ReportType,
    /// Supervisors, nearest first, at most one per approval level.
    pub supervisors: Vec<String>,
}

impl LeaveEngine {
    /// Totals, usage and pending counts for each of an employee's leave types.
    pub fn balance_summary(&self, emp_id: &str, year: i32) -> HrResult<BalanceSummary> {
        self.store.read(|tx| {
            require_employee(tx, emp_id)?;
            let pending = tx.pending_request_counts(emp_id, year)?;
            let balances = tx
                .balances_for(emp_id, year)?
                .into_iter()
                .map(|b| BalanceLine {
                    pending_requests: pending
                        .iter()
                        .find(|(leave_type, _)| *leave_type == b.leave_type)
                        .map_or(0, |(_, count)| *count),
                    leave_type: b.leave_type,
                    total: b.total,
                    used: b.used,
                    remaining: b.remaining,
                })
                .collect();
            Ok(BalanceSummary {
                emp_id: emp_id.to_string(),
                year,
                balances,
            })
        })
    }

    /// Every request of an employee, newest first, with its approval chain.
    pub fn history(&self, emp_id: &str) -> HrResult<Vec<RequestHistory>> {
        self.store.read(|tx| {
            require_employee(tx, emp_id)?;
            tx.leave_requests_for(emp_id)?
                .into_iter()
                .map(|request| -> HrResult<RequestHistory> {
                    let approvals = tx.approvals_for_request(request.id)?;
                    Ok(RequestHistory { request, approvals })
                })
                .collect()
        })
    }

    /// Approvals waiting on `approver`, oldest submission first.
    pub fn pending_queue(&self, approver: &str) -> HrResult<Vec<PendingApproval>> {
        self.store.read(|tx| {
            require_employee(tx, approver)?;
            Ok(tx
                .pending_approvals_for(approver)?
                .into_iter()
                .map(|(approval, request)| PendingApproval { approval, request })
                .collect())
        })
    }

    /// The escalation chain above `emp_id`, capped at the approval level limit.
    ///
    /// An empty chain means a submission would fail with `SupervisorNotFound`.
    pub fn reporting_chain(&self, emp_id: &str) -> HrResult<ReportingChain> {
        let report_type = self.policy().escalation_report_type;
        let max_depth = usize::try_from(self.policy().max_levels).unwrap_or(usize::MAX);
        self.store.read(|tx| {
            require_employee(tx, emp_id)?;
            let graph = ReportingGraph::load(tx)?;
            Ok(ReportingChain {
                emp_id: emp_id.to_string(),
                report_type,
                supervisors: graph.chain_of(emp_id, report_type, max_depth),
            })
        })
    }
}
