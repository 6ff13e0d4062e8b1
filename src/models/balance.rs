//! Balance views and batch accrual reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccrualMonth, EmployeeId, LeaveRequest, LeaveTypeId};

/// What the employee is entitled to for a leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entitlement {
    /// A flat allowance.
    Allowance {
        /// The allowance in days.
        max_days: Decimal,
    },
    /// Days accrued through the ledger so far.
    Accrued {
        /// Sum of accrued and adjusted days over the ledger's lifetime.
        accrued_to_date: Decimal,
    },
}

/// An employee's position for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The leave type.
    pub leave_type_id: LeaveTypeId,
    /// Display name of the leave type.
    pub leave_type_name: String,
    /// The entitlement the balance derives from.
    pub entitlement: Entitlement,
    /// Approved leave days consumed so far.
    pub used_days: Decimal,
    /// Days available now. Never negative.
    pub balance: Decimal,
    /// Requests of this type awaiting a decision.
    pub pending_requests: Vec<LeaveRequest>,
    /// Approved requests of this type that have not started yet.
    pub upcoming_leaves: Vec<LeaveRequest>,
}

/// Per-employee failure inside a batch accrual run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualBatchError {
    /// The employee whose accrual failed.
    pub employee_id: EmployeeId,
    /// Why it failed.
    pub message: String,
}

/// Outcome of processing accruals for every employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualBatchReport {
    /// The month processed.
    pub month: AccrualMonth,
    /// Employees whose ledgers were brought up to date.
    pub processed: usize,
    /// Employees whose accrual had not begun by that month.
    pub skipped: usize,
    /// Employees whose processing failed.
    pub errors: Vec<AccrualBatchError>,
}

impl AccrualBatchReport {
    /// Creates an empty report for `month`.
    pub fn new(month: AccrualMonth) -> Self {
        Self {
            month,
            processed: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }
}
