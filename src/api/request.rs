//! Request types for the leave ledger API.
//!
//! This module defines the JSON bodies and query strings accepted by the
//! ledger endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AuditFilter;
use crate::models::{AccrualMonth, AuditEntityType, EmployeeId};

/// Request body for `POST /leave-requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyLeaveRequest {
    /// The employee applying.
    pub employee_id: String,
    /// The leave type applied for (e.g., "annual").
    pub leave_type_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
}

/// Request body for `POST /leave-requests/:request_id/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveLeaveRequest {
    /// The staff member approving.
    pub approver_id: String,
}

/// Request body for `POST /leave-requests/:request_id/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectLeaveRequest {
    /// The staff member rejecting.
    pub approver_id: String,
    /// Why the request was rejected. Must not be blank.
    #[serde(default)]
    pub reason: String,
}

/// Request body for `POST /leave-requests/:request_id/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelLeaveRequest {
    /// The employee cancelling; must own the request.
    pub employee_id: String,
}

/// Request body for `POST /employees/:employee_id/accruals/:leave_type_id/adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustBalanceRequest {
    /// Signed number of days to add.
    pub days: Decimal,
    /// Why the balance is being adjusted.
    pub reason: String,
    /// The staff member making the change.
    pub performed_by: String,
}

/// Request body for `POST /employees/:employee_id/accruals/:leave_type_id/manual`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAccrualRequest {
    /// The month to credit, as `YYYY-MM`.
    pub month: AccrualMonth,
    /// Days to credit.
    pub days: Decimal,
    /// Why the days are credited.
    pub reason: String,
    /// The staff member making the change.
    pub performed_by: String,
}

/// Request body for `POST /accruals/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAccrualsRequest {
    /// The month to process, as `YYYY-MM`. Defaults to the current month.
    #[serde(default)]
    pub month: Option<AccrualMonth>,
    /// Who triggered the run.
    pub performed_by: String,
}

/// Request body for `PATCH /leave-types/:leave_type_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLeaveTypeRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New flat allowance.
    #[serde(default)]
    pub max_days: Option<Decimal>,
    /// The staff member making the change.
    pub performed_by: String,
}

/// Query string for the projected balance endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedBalanceQuery {
    /// The date to project to.
    pub date: NaiveDate,
}

/// Query string for `GET /leave-requests/upcoming`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpcomingLeavesQuery {
    /// Look-ahead in days. Defaults to the configured window.
    #[serde(default)]
    pub window_days: Option<u32>,
}

/// Query string for `GET /audit-events`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditEventsQuery {
    /// Only events about this entity.
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Only events about this kind of entity.
    #[serde(default)]
    pub entity_type: Option<AuditEntityType>,
    /// Only events performed by this actor.
    #[serde(default)]
    pub performed_by: Option<String>,
}

impl From<AuditEventsQuery> for AuditFilter {
    fn from(query: AuditEventsQuery) -> Self {
        AuditFilter {
            entity_id: query.entity_id,
            entity_type: query.entity_type,
            performed_by: query.performed_by.map(EmployeeId::new),
        }
    }
}
