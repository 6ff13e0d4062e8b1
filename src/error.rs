//! Error types for the leave ledger.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition the ledger can report, together with a coarse
//! [`ErrorKind`] classification that transports map onto status codes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::StoreError;
use crate::models::LeaveStatus;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied invalid input. Never retried.
    Validation,
    /// The request conflicts with existing ledger state.
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
    /// The caller may not perform the action on this entity.
    Forbidden,
    /// A collaborator failed; the operation may be retried.
    Infrastructure,
    /// The ledger configuration is missing or malformed.
    Configuration,
}

/// The main error type for the leave ledger.
///
/// # Example
///
/// ```
/// use leave_ledger::error::{ErrorKind, LedgerError};
///
/// let error = LedgerError::UnknownLeaveType {
///     leave_type_id: "sabbatical".to_string(),
/// };
/// assert_eq!(error.to_string(), "Leave type not found: sabbatical");
/// assert_eq!(error.kind(), ErrorKind::Validation);
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or is inconsistent.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The start date of a leave request is after its end date.
    #[error("Start date {start} must be on or before end date {end}")]
    InvalidDateRange {
        /// The requested start date.
        start: NaiveDate,
        /// The requested end date.
        end: NaiveDate,
    },

    /// Leave was requested for a date that has already passed.
    #[error("Cannot apply for leave starting {start}: today is {today}")]
    PastDate {
        /// The requested start date.
        start: NaiveDate,
        /// The ledger's current date.
        today: NaiveDate,
    },

    /// The leave type is not in the registry.
    #[error("Leave type not found: {leave_type_id}")]
    UnknownLeaveType {
        /// The leave type that was not found.
        leave_type_id: String,
    },

    /// A ledger operation was attempted on a flat-allowance leave type.
    #[error("Leave type '{leave_type_id}' does not accrue monthly")]
    NotAccrualBearing {
        /// The flat-allowance leave type.
        leave_type_id: String,
    },

    /// A rejection was submitted without a reason.
    #[error("A reason is required to reject a leave request")]
    MissingReason,

    /// A field carried a value the ledger cannot accept.
    #[error("Invalid value for '{field}': {message}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// What made the value invalid.
        message: String,
    },

    /// The employee already has active leave intersecting the requested dates.
    #[error("Employee {employee_id} already has leave overlapping {start} to {end}")]
    Overlap {
        /// The employee applying for leave.
        employee_id: String,
        /// The requested start date.
        start: NaiveDate,
        /// The requested end date.
        end: NaiveDate,
    },

    /// The employee does not have enough leave for the request.
    #[error("Insufficient leave balance: {available} days available, {requested} days requested")]
    InsufficientBalance {
        /// The balance the request was evaluated against.
        available: Decimal,
        /// The number of days requested.
        requested: Decimal,
    },

    /// A decision was attempted on a request that is no longer pending.
    #[error("Leave request {request_id} is not pending (status: {status})")]
    NotPending {
        /// The request.
        request_id: String,
        /// Its current status.
        status: LeaveStatus,
    },

    /// Only pending or approved requests can be cancelled.
    #[error("Leave request {request_id} cannot be cancelled from status {status}")]
    NotCancellable {
        /// The request.
        request_id: String,
        /// Its current status.
        status: LeaveStatus,
    },

    /// Approved leave that has already started cannot be cancelled.
    #[error("Leave request {request_id} already started on {start_date}")]
    AlreadyStarted {
        /// The request.
        request_id: String,
        /// The date the leave started.
        start_date: NaiveDate,
    },

    /// An employee tried to act on someone else's request.
    #[error("Employee {employee_id} does not own leave request {request_id}")]
    NotOwner {
        /// The request.
        request_id: String,
        /// The employee attempting the action.
        employee_id: String,
    },

    /// The leave request does not exist.
    #[error("Leave request not found: {request_id}")]
    RequestNotFound {
        /// The request that was not found.
        request_id: String,
    },

    /// The employee does not exist in the directory.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The employee that was not found.
        employee_id: String,
    },

    /// A lock or store call did not complete in time.
    #[error("Timed out waiting for {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// A store collaborator failed.
    #[error("Ledger store unavailable: {message}")]
    Store {
        /// A description of the failure.
        message: String,
    },
}

impl LedgerError {
    /// Classifies the error for callers and transports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ConfigNotFound { .. } | LedgerError::ConfigParseError { .. } => {
                ErrorKind::Configuration
            }
            LedgerError::InvalidDateRange { .. }
            | LedgerError::PastDate { .. }
            | LedgerError::UnknownLeaveType { .. }
            | LedgerError::NotAccrualBearing { .. }
            | LedgerError::MissingReason
            | LedgerError::InvalidInput { .. } => ErrorKind::Validation,
            LedgerError::Overlap { .. }
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::NotPending { .. }
            | LedgerError::NotCancellable { .. }
            | LedgerError::AlreadyStarted { .. } => ErrorKind::Conflict,
            LedgerError::RequestNotFound { .. } | LedgerError::EmployeeNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::NotOwner { .. } => ErrorKind::Forbidden,
            LedgerError::Timeout { .. } | LedgerError::Store { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Returns true when repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Timeout { operation } => LedgerError::Timeout { operation },
            other => LedgerError::Store {
                message: other.to_string(),
            },
        }
    }
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
