//! HTTP request handlers for the leave ledger API.
//!
//! This module contains the handler functions for all API endpoints. Ledger
//! calls block on per-employee locks, so every handler runs its ledger work
//! on the blocking thread pool.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::ledger::{AuditFilter, LeaveLedger};
use crate::models::{
    AccrualBatchReport, AccrualMonth, AuditEvent, EmployeeId, LeaveAccrualRecord, LeaveBalance,
    LeaveRequest, LeaveRequestId, LeaveType, LeaveTypeId,
};

use super::request::{
    AdjustBalanceRequest, ApplyLeaveRequest, ApproveLeaveRequest, AuditEventsQuery,
    CancelLeaveRequest, ManualAccrualRequest, ProcessAccrualsRequest, ProjectedBalanceQuery,
    RejectLeaveRequest, UpcomingLeavesQuery, UpdateLeaveTypeRequest,
};
use super::response::{ApiError, ApiErrorResponse, ProjectedBalanceResponse};
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/leave-types", get(list_leave_types_handler))
        .route("/leave-types/:leave_type_id", patch(update_leave_type_handler))
        .route("/leave-requests", post(apply_leave_handler))
        .route("/leave-requests/pending", get(pending_requests_handler))
        .route("/leave-requests/upcoming", get(upcoming_leaves_handler))
        .route("/leave-requests/:request_id", get(get_request_handler))
        .route("/leave-requests/:request_id/approve", post(approve_leave_handler))
        .route("/leave-requests/:request_id/reject", post(reject_leave_handler))
        .route("/leave-requests/:request_id/cancel", post(cancel_leave_handler))
        .route("/leave-requests/:request_id/audit", get(request_audit_handler))
        .route(
            "/employees/:employee_id/leave-requests",
            get(employee_requests_handler),
        )
        .route("/employees/:employee_id/balances", get(employee_balances_handler))
        .route(
            "/employees/:employee_id/balances/:leave_type_id",
            get(balance_handler),
        )
        .route(
            "/employees/:employee_id/balances/:leave_type_id/projected",
            get(projected_balance_handler),
        )
        .route(
            "/employees/:employee_id/accruals/:leave_type_id",
            get(accrual_history_handler),
        )
        .route(
            "/employees/:employee_id/accruals/:leave_type_id/adjustments",
            post(adjust_balance_handler),
        )
        .route(
            "/employees/:employee_id/accruals/:leave_type_id/manual",
            post(manual_accrual_handler),
        )
        .route("/accruals/process", post(process_accruals_handler))
        .route("/audit-events", get(audit_events_handler))
        .with_state(state)
}

/// Runs `work` against the ledger on the blocking pool.
async fn run_blocking<T, F>(
    state: &AppState,
    correlation_id: Uuid,
    operation: &'static str,
    work: F,
) -> Result<T, ApiErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(&LeaveLedger) -> LedgerResult<T> + Send + 'static,
{
    let ledger = state.shared_ledger();
    let start_time = Instant::now();

    match tokio::task::spawn_blocking(move || work(&ledger)).await {
        Ok(Ok(value)) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = start_time.elapsed().as_micros(),
                "Ledger operation completed"
            );
            Ok(value)
        }
        Ok(Err(err)) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                retryable = err.is_retryable(),
                "Ledger operation failed"
            );
            Err(err.into())
        }
        Err(join_error) => {
            error!(
                correlation_id = %correlation_id,
                operation,
                error = %join_error,
                "Ledger task did not complete"
            );
            Err(ApiErrorResponse::internal("Ledger operation did not complete"))
        }
    }
}

/// Unwraps a JSON body or converts the rejection into an API error.
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description of the problem
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Unwraps query parameters or converts the rejection into an API error.
fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            let body_text = rejection.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "Invalid query string"
            );
            Err(ApiErrorResponse::bad_request(ApiError::validation_error(
                body_text,
            )))
        }
    }
}

fn parse_request_id(raw: &str) -> Result<LeaveRequestId, ApiErrorResponse> {
    raw.parse().map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::with_details(
            "INVALID_REQUEST_ID",
            format!("Invalid leave request id: {}", raw),
            "Leave request ids are UUIDs",
        ))
    })
}

// ============================================================================
// Leave types
// ============================================================================

/// Handler for GET /leave-types.
async fn list_leave_types_handler(State(state): State<AppState>) -> Json<Vec<LeaveType>> {
    Json(state.ledger().leave_types())
}

/// Handler for PATCH /leave-types/:leave_type_id.
async fn update_leave_type_handler(
    State(state): State<AppState>,
    Path(leave_type_id): Path<String>,
    payload: Result<Json<UpdateLeaveTypeRequest>, JsonRejection>,
) -> ApiResult<LeaveType> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, leave_type_id = %leave_type_id, "Updating leave type");
    let request = json_body(payload, correlation_id)?;

    let updated = run_blocking(&state, correlation_id, "update_leave_type", move |ledger| {
        ledger.update_leave_type(
            &LeaveTypeId::new(leave_type_id),
            request.name,
            request.max_days,
            &EmployeeId::new(request.performed_by),
        )
    })
    .await?;
    Ok(Json(updated))
}

// ============================================================================
// Request lifecycle
// ============================================================================

/// Handler for POST /leave-requests.
///
/// Creates a pending request; responds 201 with the stored request.
async fn apply_leave_handler(
    State(state): State<AppState>,
    payload: Result<Json<ApplyLeaveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing leave application");
    let request = json_body(payload, correlation_id)?;

    let created = run_blocking(&state, correlation_id, "apply_leave", move |ledger| {
        ledger.apply_leave(
            &EmployeeId::new(request.employee_id),
            &LeaveTypeId::new(request.leave_type_id),
            request.start_date,
            request.end_date,
            &request.reason,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /leave-requests/:request_id.
async fn get_request_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<LeaveRequest> {
    let correlation_id = Uuid::new_v4();
    let request_id = parse_request_id(&request_id)?;
    let request = run_blocking(&state, correlation_id, "get_request", move |ledger| {
        ledger.get_request(request_id)
    })
    .await?;
    Ok(Json(request))
}

/// Handler for POST /leave-requests/:request_id/approve.
async fn approve_leave_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    payload: Result<Json<ApproveLeaveRequest>, JsonRejection>,
) -> ApiResult<LeaveRequest> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, request_id = %request_id, "Approving leave request");
    let request_id = parse_request_id(&request_id)?;
    let body = json_body(payload, correlation_id)?;

    let approved = run_blocking(&state, correlation_id, "approve_leave", move |ledger| {
        ledger.approve_leave(request_id, &EmployeeId::new(body.approver_id))
    })
    .await?;
    Ok(Json(approved))
}

/// Handler for POST /leave-requests/:request_id/reject.
async fn reject_leave_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    payload: Result<Json<RejectLeaveRequest>, JsonRejection>,
) -> ApiResult<LeaveRequest> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, request_id = %request_id, "Rejecting leave request");
    let request_id = parse_request_id(&request_id)?;
    let body = json_body(payload, correlation_id)?;

    let rejected = run_blocking(&state, correlation_id, "reject_leave", move |ledger| {
        ledger.reject_leave(request_id, &EmployeeId::new(body.approver_id), &body.reason)
    })
    .await?;
    Ok(Json(rejected))
}

/// Handler for POST /leave-requests/:request_id/cancel.
async fn cancel_leave_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    payload: Result<Json<CancelLeaveRequest>, JsonRejection>,
) -> ApiResult<LeaveRequest> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, request_id = %request_id, "Cancelling leave request");
    let request_id = parse_request_id(&request_id)?;
    let body = json_body(payload, correlation_id)?;

    let cancelled = run_blocking(&state, correlation_id, "cancel_leave", move |ledger| {
        ledger.cancel_leave(request_id, &EmployeeId::new(body.employee_id))
    })
    .await?;
    Ok(Json(cancelled))
}

/// Handler for GET /leave-requests/:request_id/audit.
async fn request_audit_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Vec<AuditEvent>> {
    let correlation_id = Uuid::new_v4();
    let request_id = parse_request_id(&request_id)?;
    let events = run_blocking(&state, correlation_id, "request_audit_trail", move |ledger| {
        ledger.request_audit_trail(request_id)
    })
    .await?;
    Ok(Json(events))
}

/// Handler for GET /leave-requests/pending.
async fn pending_requests_handler(State(state): State<AppState>) -> ApiResult<Vec<LeaveRequest>> {
    let correlation_id = Uuid::new_v4();
    let pending = run_blocking(&state, correlation_id, "pending_requests", |ledger| {
        ledger.pending_requests()
    })
    .await?;
    Ok(Json(pending))
}

/// Handler for GET /leave-requests/upcoming.
async fn upcoming_leaves_handler(
    State(state): State<AppState>,
    query: Result<Query<UpcomingLeavesQuery>, QueryRejection>,
) -> ApiResult<Vec<LeaveRequest>> {
    let correlation_id = Uuid::new_v4();
    let params = query_params(query, correlation_id)?;
    let upcoming = run_blocking(&state, correlation_id, "upcoming_leaves", move |ledger| {
        ledger.upcoming_leaves(params.window_days)
    })
    .await?;
    Ok(Json(upcoming))
}

/// Handler for GET /employees/:employee_id/leave-requests.
async fn employee_requests_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> ApiResult<Vec<LeaveRequest>> {
    let correlation_id = Uuid::new_v4();
    let requests = run_blocking(&state, correlation_id, "employee_requests", move |ledger| {
        ledger.employee_requests(&EmployeeId::new(employee_id))
    })
    .await?;
    Ok(Json(requests))
}

// ============================================================================
// Balances
// ============================================================================

/// Handler for GET /employees/:employee_id/balances.
async fn employee_balances_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> ApiResult<Vec<LeaveBalance>> {
    let correlation_id = Uuid::new_v4();
    let balances = run_blocking(&state, correlation_id, "balances_for_employee", move |ledger| {
        ledger.balances_for_employee(&EmployeeId::new(employee_id))
    })
    .await?;
    Ok(Json(balances))
}

/// Handler for GET /employees/:employee_id/balances/:leave_type_id.
async fn balance_handler(
    State(state): State<AppState>,
    Path((employee_id, leave_type_id)): Path<(String, String)>,
) -> ApiResult<LeaveBalance> {
    let correlation_id = Uuid::new_v4();
    let balance = run_blocking(&state, correlation_id, "get_balance", move |ledger| {
        ledger.get_balance(&EmployeeId::new(employee_id), &LeaveTypeId::new(leave_type_id))
    })
    .await?;
    Ok(Json(balance))
}

/// Handler for GET /employees/:employee_id/balances/:leave_type_id/projected.
async fn projected_balance_handler(
    State(state): State<AppState>,
    Path((employee_id, leave_type_id)): Path<(String, String)>,
    query: Result<Query<ProjectedBalanceQuery>, QueryRejection>,
) -> ApiResult<ProjectedBalanceResponse> {
    let correlation_id = Uuid::new_v4();
    let params = query_params(query, correlation_id)?;
    let employee_id = EmployeeId::new(employee_id);
    let leave_type_id = LeaveTypeId::new(leave_type_id);

    let response = run_blocking(&state, correlation_id, "get_projected_balance", move |ledger| {
        let projected_balance =
            ledger.get_projected_balance(&employee_id, &leave_type_id, params.date)?;
        Ok(ProjectedBalanceResponse {
            employee_id,
            leave_type_id,
            date: params.date,
            projected_balance,
        })
    })
    .await?;
    Ok(Json(response))
}

// ============================================================================
// Accrual ledger
// ============================================================================

/// Handler for GET /employees/:employee_id/accruals/:leave_type_id.
async fn accrual_history_handler(
    State(state): State<AppState>,
    Path((employee_id, leave_type_id)): Path<(String, String)>,
) -> ApiResult<Vec<LeaveAccrualRecord>> {
    let correlation_id = Uuid::new_v4();
    let history = run_blocking(&state, correlation_id, "accrual_history", move |ledger| {
        ledger.accrual_history(&EmployeeId::new(employee_id), &LeaveTypeId::new(leave_type_id))
    })
    .await?;
    Ok(Json(history))
}

/// Handler for POST /employees/:employee_id/accruals/:leave_type_id/adjustments.
async fn adjust_balance_handler(
    State(state): State<AppState>,
    Path((employee_id, leave_type_id)): Path<(String, String)>,
    payload: Result<Json<AdjustBalanceRequest>, JsonRejection>,
) -> ApiResult<LeaveAccrualRecord> {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        leave_type_id = %leave_type_id,
        "Adjusting leave balance"
    );
    let body = json_body(payload, correlation_id)?;

    let record = run_blocking(&state, correlation_id, "adjust_balance", move |ledger| {
        ledger.adjust_balance(
            &EmployeeId::new(employee_id),
            &LeaveTypeId::new(leave_type_id),
            body.days,
            &body.reason,
            &EmployeeId::new(body.performed_by),
        )
    })
    .await?;
    Ok(Json(record))
}

/// Handler for POST /employees/:employee_id/accruals/:leave_type_id/manual.
async fn manual_accrual_handler(
    State(state): State<AppState>,
    Path((employee_id, leave_type_id)): Path<(String, String)>,
    payload: Result<Json<ManualAccrualRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        leave_type_id = %leave_type_id,
        "Adding manual accrual"
    );
    let body = json_body(payload, correlation_id)?;

    let record = run_blocking(&state, correlation_id, "add_manual_accrual", move |ledger| {
        ledger.add_manual_accrual(
            &EmployeeId::new(employee_id),
            &LeaveTypeId::new(leave_type_id),
            body.month,
            body.days,
            &body.reason,
            &EmployeeId::new(body.performed_by),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for POST /accruals/process.
///
/// Processes the given month, or the current month when none is given.
async fn process_accruals_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProcessAccrualsRequest>, JsonRejection>,
) -> ApiResult<AccrualBatchReport> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing batch accruals");
    let body = json_body(payload, correlation_id)?;

    let report = run_blocking(&state, correlation_id, "process_accruals_for_month", move |ledger| {
        let month = body
            .month
            .unwrap_or_else(|| AccrualMonth::containing(ledger.today()));
        ledger.process_accruals_for_month(month, &EmployeeId::new(body.performed_by))
    })
    .await?;
    Ok(Json(report))
}

// ============================================================================
// Audit
// ============================================================================

/// Handler for GET /audit-events.
async fn audit_events_handler(
    State(state): State<AppState>,
    query: Result<Query<AuditEventsQuery>, QueryRejection>,
) -> ApiResult<Vec<AuditEvent>> {
    let correlation_id = Uuid::new_v4();
    let filter: AuditFilter = query_params(query, correlation_id)?.into();
    let events = run_blocking(&state, correlation_id, "audit_events", move |ledger| {
        ledger.audit_events(&filter)
    })
    .await?;
    Ok(Json(events))
}
