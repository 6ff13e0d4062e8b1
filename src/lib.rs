//! Leave Entitlement Ledger & Accrual Engine
//!
//! This crate tracks employee leave: a catalog of leave types with flat or
//! monthly-accrual policies, an append-only monthly accrual ledger per
//! employee, the leave request lifecycle, and an audit trail of every change.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
