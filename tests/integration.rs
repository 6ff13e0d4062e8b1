//! Integration tests for the leave ledger HTTP API.
//!
//! This test suite drives the router end to end:
//! - Applying for, approving, rejecting and cancelling leave
//! - Current and projected balances
//! - The monthly accrual ledger, manual adjustments and batch processing
//! - Audit trails
//! - Error cases and their status codes
//!
//! The ledger runs on a fixed clock reading 2025-06-10 with the standard
//! catalog and employee seed. emp_001 was hired 2024-01-15 and sits at the
//! 24-day annual cap.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use leave_ledger::api::{AppState, create_router};
use leave_ledger::config::ConfigLoader;
use leave_ledger::ledger::{FixedClock, InMemoryEmployeeDirectory, LeaveLedger, LedgerStores};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/standard").expect("Failed to load config");
    let employees = InMemoryEmployeeDirectory::with_employees(config.employees().to_vec());
    let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    AppState::new(LeaveLedger::new(
        config.registry(),
        LedgerStores::in_memory(employees),
        Arc::new(FixedClock::new(today)),
        config.settings().clone(),
    ))
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

/// Normalize decimal string by removing trailing zeros after decimal point
fn normalize_decimal(s: &str) -> String {
    Decimal::from_str(s).unwrap().normalize().to_string()
}

fn assert_days(value: &Value, expected: &str) {
    let actual = value
        .as_str()
        .unwrap_or_else(|| panic!("Expected a decimal string, got {}", value));
    assert_eq!(
        normalize_decimal(actual),
        normalize_decimal(expected),
        "Expected {} days, got {}",
        expected,
        actual
    );
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn apply(
    router: &Router,
    employee_id: &str,
    leave_type_id: &str,
    start: &str,
    end: &str,
) -> (StatusCode, Value) {
    send(
        router,
        "POST",
        "/leave-requests",
        Some(json!({
            "employee_id": employee_id,
            "leave_type_id": leave_type_id,
            "start_date": start,
            "end_date": end,
            "reason": "Time off"
        })),
    )
    .await
}

async fn apply_and_approve(router: &Router, start: &str, end: &str) -> String {
    let (status, created) = apply(router, "emp_001", "annual", start, end).await;
    assert_eq!(status, StatusCode::CREATED, "apply failed: {}", created);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, approved) = send(
        router,
        "POST",
        &format!("/leave-requests/{}/approve", id),
        Some(json!({ "approver_id": "mgr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "approve failed: {}", approved);
    id
}

async fn annual_balance(router: &Router) -> Value {
    let (status, balance) = send(router, "GET", "/employees/emp_001/balances/annual", None).await;
    assert_eq!(status, StatusCode::OK);
    balance
}

// =============================================================================
// Request lifecycle
// =============================================================================

#[tokio::test]
async fn test_apply_then_approve_reduces_balance() {
    let router = create_router_for_test();
    assert_days(&annual_balance(&router).await["balance"], "24");

    let id = apply_and_approve(&router, "2025-06-16", "2025-06-20").await;

    let (status, request) = send(&router, "GET", &format!("/leave-requests/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["status"], "approved");
    assert_eq!(request["approved_by"], "mgr_001");

    let balance = annual_balance(&router).await;
    assert_days(&balance["balance"], "19");
    assert_eq!(balance["upcoming_leaves"].as_array().unwrap().len(), 1);
    assert!(balance["pending_requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_request_is_listed_until_decided() {
    let router = create_router_for_test();
    let (_, created) = apply(&router, "emp_001", "annual", "2025-06-16", "2025-06-17").await;
    let id = created["id"].as_str().unwrap();

    let (status, pending) = send(&router, "GET", "/leave-requests/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, error) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/reject", id),
        Some(json!({ "approver_id": "mgr_001", "reason": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MISSING_REASON");

    let (status, rejected) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/reject", id),
        Some(json!({ "approver_id": "mgr_001", "reason": "Release week" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["rejection_reason"], "Release week");

    let (_, pending) = send(&router, "GET", "/leave-requests/pending", None).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deciding_twice_returns_409() {
    let router = create_router_for_test();
    let id = apply_and_approve(&router, "2025-06-16", "2025-06-17").await;

    let (status, error) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/approve", id),
        Some(json!({ "approver_id": "mgr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "NOT_PENDING");
}

#[tokio::test]
async fn test_cancel_own_future_leave_restores_balance() {
    let router = create_router_for_test();
    let id = apply_and_approve(&router, "2025-06-16", "2025-06-20").await;

    let (status, error) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/cancel", id),
        Some(json!({ "employee_id": "emp_002" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "NOT_OWNER");

    let (status, cancelled) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/cancel", id),
        Some(json!({ "employee_id": "emp_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_days(&annual_balance(&router).await["balance"], "24");

    let (status, error) = send(
        &router,
        "POST",
        &format!("/leave-requests/{}/cancel", id),
        Some(json!({ "employee_id": "emp_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "NOT_CANCELLABLE");
}

#[tokio::test]
async fn test_unknown_request_returns_404() {
    let router = create_router_for_test();
    let (status, error) = send(
        &router,
        "POST",
        "/leave-requests/6a2f41a3-c54c-4c4b-9e3c-2f0b7f9b1d11/approve",
        Some(json!({ "approver_id": "mgr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "REQUEST_NOT_FOUND");
}

// =============================================================================
// Apply validation
// =============================================================================

#[tokio::test]
async fn test_apply_validation_status_codes() {
    let router = create_router_for_test();

    let (status, error) = apply(&router, "emp_001", "annual", "2025-06-20", "2025-06-16").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_DATE_RANGE");

    let (status, error) = apply(&router, "emp_001", "annual", "2025-06-01", "2025-06-02").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "PAST_DATE");

    let (status, error) = apply(&router, "emp_001", "sabbatical", "2025-06-16", "2025-06-16").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "UNKNOWN_LEAVE_TYPE");

    let (status, error) = apply(&router, "emp_404", "annual", "2025-06-16", "2025-06-16").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "EMPLOYEE_NOT_FOUND");
}

#[tokio::test]
async fn test_apply_beyond_balance_returns_409() {
    let router = create_router_for_test();
    let (status, error) = apply(&router, "emp_001", "sick", "2025-06-16", "2025-06-30").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "INSUFFICIENT_BALANCE");
    assert!(error["message"].as_str().unwrap().contains("15 days requested"));
}

#[tokio::test]
async fn test_overlap_across_leave_types_returns_409() {
    let router = create_router_for_test();
    let (status, _) = apply(&router, "emp_001", "sick", "2025-06-16", "2025-06-17").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = apply(&router, "emp_001", "annual", "2025-06-17", "2025-06-18").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "OVERLAPPING_LEAVE");

    // Another employee is unaffected
    let (status, _) = apply(&router, "emp_002", "annual", "2025-06-17", "2025-06-18").await;
    assert_eq!(status, StatusCode::CREATED);
}

// =============================================================================
// Balances
// =============================================================================

#[tokio::test]
async fn test_balances_cover_whole_catalog() {
    let router = create_router_for_test();
    let (status, balances) = send(&router, "GET", "/employees/emp_001/balances", None).await;
    assert_eq!(status, StatusCode::OK);

    let balances = balances.as_array().unwrap();
    assert_eq!(balances.len(), 5);
    let maternity = balances
        .iter()
        .find(|b| b["leave_type_id"] == "maternity")
        .unwrap();
    assert_days(&maternity["balance"], "90");
    assert_eq!(maternity["entitlement"]["kind"], "allowance");
}

#[tokio::test]
async fn test_projected_balance_charges_pending_leave_and_accrues() {
    let router = create_router_for_test();
    let (status, _) = apply(&router, "emp_001", "annual", "2025-07-07", "2025-07-11").await;
    assert_eq!(status, StatusCode::CREATED);

    // June 24, July 24 - 5, August +2, September +2
    let (status, projected) = send(
        &router,
        "GET",
        "/employees/emp_001/balances/annual/projected?date=2025-09-15",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_days(&projected["projected_balance"], "23");
    assert_eq!(projected["date"], "2025-09-15");
}

#[tokio::test]
async fn test_projected_balance_of_past_date_is_current() {
    let router = create_router_for_test();
    let (status, projected) = send(
        &router,
        "GET",
        "/employees/emp_001/balances/annual/projected?date=2025-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_days(&projected["projected_balance"], "24");
}

// =============================================================================
// Accrual ledger
// =============================================================================

#[tokio::test]
async fn test_accrual_history_catches_up_to_current_month() {
    let router = create_router_for_test();
    let (status, history) = send(&router, "GET", "/employees/emp_001/accruals/annual", None).await;
    assert_eq!(status, StatusCode::OK);

    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 17);
    assert_eq!(history[0]["accrual_month"], "2024-02");
    assert_eq!(history[16]["accrual_month"], "2025-06");
    assert_eq!(history[15]["is_processed"], true);
    assert_eq!(history[16]["is_processed"], false);
    assert_days(&history[11]["days_balance"], "24");
    assert_days(&history[12]["days_accrued"], "0");
}

#[tokio::test]
async fn test_flat_type_has_no_accrual_ledger() {
    let router = create_router_for_test();
    let (status, error) = send(&router, "GET", "/employees/emp_001/accruals/sick", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "NOT_ACCRUAL_BEARING");
}

#[tokio::test]
async fn test_adjustment_lifts_balance_above_cap() {
    let router = create_router_for_test();
    let (status, record) = send(
        &router,
        "POST",
        "/employees/emp_001/accruals/annual/adjustments",
        Some(json!({ "days": "2", "reason": "Long service", "performed_by": "hr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["accrual_month"], "2025-06");
    assert_days(&record["days_balance"], "26");
    assert_eq!(record["notes"], "Manual adjustment: +2 days (Long service)");

    let (_, events) = send(
        &router,
        "GET",
        "/audit-events?entity_type=leave_accrual&performed_by=hr_001",
        None,
    )
    .await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["action"], "UPDATE");
}

#[tokio::test]
async fn test_manual_accrual_returns_201() {
    let router = create_router_for_test();
    let (status, record) = send(
        &router,
        "POST",
        "/employees/emp_002/accruals/annual/manual",
        Some(json!({
            "month": "2025-04",
            "days": "1.5",
            "reason": "Weekend on-call",
            "performed_by": "hr_001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["accrual_month"], "2025-04");
    assert_days(&record["days_adjusted"], "1.5");

    let (status, error) = send(
        &router,
        "POST",
        "/employees/emp_002/accruals/annual/manual",
        Some(json!({
            "month": "2025-08",
            "days": "1",
            "reason": "Early",
            "performed_by": "hr_001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_batch_defaults_to_current_month_and_is_audited() {
    let router = create_router_for_test();
    let (status, report) = send(
        &router,
        "POST",
        "/accruals/process",
        Some(json!({ "performed_by": "hr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["month"], "2025-06");
    assert_eq!(report["processed"], 3);
    assert_eq!(report["skipped"], 0);
    assert!(report["errors"].as_array().unwrap().is_empty());

    let (_, events) = send(&router, "GET", "/audit-events?entity_type=accrual_batch", None).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["entity_id"], "2025-06");
    assert_eq!(events[0]["action"], "CREATE");
}

#[tokio::test]
async fn test_batch_rejects_future_month() {
    let router = create_router_for_test();
    let (status, error) = send(
        &router,
        "POST",
        "/accruals/process",
        Some(json!({ "month": "2025-07", "performed_by": "hr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Leave types
// =============================================================================

#[tokio::test]
async fn test_update_leave_type_allowance() {
    let router = create_router_for_test();
    let (status, updated) = send(
        &router,
        "PATCH",
        "/leave-types/sick",
        Some(json!({ "max_days": "15", "performed_by": "hr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_days(&updated["policy"]["max_days"], "15");

    let (_, types) = send(&router, "GET", "/leave-types", None).await;
    let sick = types
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == "sick")
        .unwrap()
        .clone();
    assert_days(&sick["policy"]["max_days"], "15");

    let (status, _) = send(
        &router,
        "PATCH",
        "/leave-types/annual",
        Some(json!({ "max_days": "30", "performed_by": "hr_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Queries and audit
// =============================================================================

#[tokio::test]
async fn test_request_audit_trail_and_listings() {
    let router = create_router_for_test();
    let id = apply_and_approve(&router, "2025-06-20", "2025-06-20").await;

    let (status, trail) = send(&router, "GET", &format!("/leave-requests/{}/audit", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = trail
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["CREATE", "APPROVE"]);

    let (_, upcoming) = send(&router, "GET", "/leave-requests/upcoming", None).await;
    assert_eq!(upcoming.as_array().unwrap().len(), 1);

    let (_, upcoming) = send(&router, "GET", "/leave-requests/upcoming?window_days=5", None).await;
    assert!(upcoming.as_array().unwrap().is_empty());

    let (status, mine) = send(&router, "GET", "/employees/emp_001/leave-requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}
