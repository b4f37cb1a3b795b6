//! HR back-office core
//!
//! This crate turns biometric punches into daily and weekly attendance and
//! runs leave requests through a multi-level approval chain derived from
//! the reporting graph, keeping per-year leave balances consistent and
//! notifying reachable approvers and applicants.

#![warn(missing_docs)]

pub mod api;
pub mod attendance;
pub mod config;
pub mod error;
pub mod leave;
pub mod models;
pub mod notify;
pub mod store;
