//! HTTP API module for the HR back-office service.
//!
//! This module exposes leave submission and decisions, balance and queue
//! views, attendance recomputation and aggregates, punch ingestion and a
//! server-sent notification stream.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BalanceQuery, DecisionRequest, PunchBatch, RecomputeRequest, WeekQuery, WindowQuery,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
