//! Response types for the leave ledger API.
//!
//! This module defines the error response structures and the mapping from
//! [`LedgerError`] onto HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, LedgerError};
use crate::models::{EmployeeId, LeaveTypeId};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// A 500 response for failures outside the ledger.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new("INTERNAL_ERROR", message),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Infrastructure => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<LedgerError> for ApiErrorResponse {
    fn from(error: LedgerError) -> Self {
        let status = status_for(error.kind());
        let message = error.to_string();
        let error = match error {
            LedgerError::ConfigNotFound { .. } | LedgerError::ConfigParseError { .. } => {
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message)
            }
            LedgerError::InvalidDateRange { .. } => ApiError::new("INVALID_DATE_RANGE", message),
            LedgerError::PastDate { .. } => ApiError::new("PAST_DATE", message),
            LedgerError::UnknownLeaveType { .. } => ApiError::new("UNKNOWN_LEAVE_TYPE", message),
            LedgerError::NotAccrualBearing { .. } => ApiError::with_details(
                "NOT_ACCRUAL_BEARING",
                message,
                "Only monthly accrual leave types have an accrual ledger",
            ),
            LedgerError::MissingReason => ApiError::new("MISSING_REASON", message),
            LedgerError::InvalidInput { .. } => ApiError::validation_error(message),
            LedgerError::Overlap { .. } => ApiError::new("OVERLAPPING_LEAVE", message),
            LedgerError::InsufficientBalance { .. } => {
                ApiError::new("INSUFFICIENT_BALANCE", message)
            }
            LedgerError::NotPending { .. } => ApiError::new("NOT_PENDING", message),
            LedgerError::NotCancellable { .. } => ApiError::new("NOT_CANCELLABLE", message),
            LedgerError::AlreadyStarted { .. } => ApiError::new("ALREADY_STARTED", message),
            LedgerError::NotOwner { .. } => ApiError::new("NOT_OWNER", message),
            LedgerError::RequestNotFound { .. } => ApiError::new("REQUEST_NOT_FOUND", message),
            LedgerError::EmployeeNotFound { .. } => ApiError::new("EMPLOYEE_NOT_FOUND", message),
            LedgerError::Timeout { .. } => {
                ApiError::with_details("TIMEOUT", message, "The operation may be retried")
            }
            LedgerError::Store { .. } => {
                ApiError::with_details("STORE_UNAVAILABLE", message, "The operation may be retried")
            }
        };
        ApiErrorResponse { status, error }
    }
}

/// Response body for the projected balance endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedBalanceResponse {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The leave type.
    pub leave_type_id: LeaveTypeId,
    /// The date projected to.
    pub date: NaiveDate,
    /// Days expected to be available on `date`.
    pub projected_balance: Decimal,
}
