//! Configuration types for the leave ledger.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{AccrualPolicy, Employee, LeaveType, LeaveTypeId};

/// One entry of the leave type catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveTypeEntry {
    /// Unique identifier (e.g., "annual").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// How entitlement is granted.
    pub policy: AccrualPolicy,
}

impl From<LeaveTypeEntry> for LeaveType {
    fn from(entry: LeaveTypeEntry) -> Self {
        LeaveType {
            id: LeaveTypeId::new(entry.id),
            name: entry.name,
            policy: entry.policy,
        }
    }
}

/// Leave types configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveTypesConfig {
    /// The catalog, in display order.
    pub leave_types: Vec<LeaveTypeEntry>,
}

/// Employee seed file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeesConfig {
    /// Employees loaded into the directory at startup.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_upcoming_window_days() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Operational settings of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerSettings {
    /// How long to wait for an employee's ledger lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Default look-ahead for upcoming approved leave.
    #[serde(default = "default_upcoming_window_days")]
    pub upcoming_window_days: u32,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl LedgerSettings {
    /// The lock timeout as a duration.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            upcoming_window_days: default_upcoming_window_days(),
            log_level: default_log_level(),
        }
    }
}

/// Returns a description of why `policy` is invalid, if it is.
pub(crate) fn policy_problem(policy: &AccrualPolicy) -> Option<String> {
    let negative = |value: &Decimal| value.is_sign_negative() && !value.is_zero();
    match policy {
        AccrualPolicy::Flat { max_days } if negative(max_days) => {
            Some(format!("max_days must not be negative, got {max_days}"))
        }
        AccrualPolicy::MonthlyAccrual {
            monthly_rate,
            annual_cap,
        } if negative(monthly_rate) || negative(annual_cap) => Some(format!(
            "monthly_rate and annual_cap must not be negative, got {monthly_rate} and {annual_cap}"
        )),
        _ => None,
    }
}
