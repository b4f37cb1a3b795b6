//! The leave workflow.
//!
//! - [`reporting`]: who approves for whom.
//! - [`ledger`]: per-year leave balances.
//! - [`engine`]: submission and the multi-level approval state machine.
//! - [`summary`]: balance, history, queue and reporting chain views.

pub mod engine;
pub mod ledger;
pub mod reporting;
pub mod summary;

pub use engine::{
    ApprovalPolicy, DEFAULT_MAX_APPROVAL_LEVELS, DecisionOutcome, LeaveApplication, LeaveEngine,
    SubmittedLeave,
};
pub use reporting::ReportingGraph;
pub use summary::{BalanceLine, BalanceSummary, PendingApproval, ReportingChain, RequestHistory};
