//! Core data models for the leave ledger.
//!
//! This module contains all the domain models used throughout the ledger.

mod accrual_record;
mod audit_event;
mod balance;
mod employee;
mod leave_request;
mod leave_type;

pub use accrual_record::{AccrualMonth, LeaveAccrualRecord, LedgerKey};
pub use audit_event::{AuditAction, AuditEntityType, AuditEvent};
pub use balance::{AccrualBatchError, AccrualBatchReport, Entitlement, LeaveBalance};
pub use employee::{Employee, EmployeeId};
pub use leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus, inclusive_days};
pub use leave_type::{
    AccrualPolicy, LeaveType, LeaveTypeId, STANDARD_ANNUAL_CAP, STANDARD_MONTHLY_RATE,
};
