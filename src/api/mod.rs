//! HTTP API module for the leave ledger.
//!
//! This module provides the REST API endpoints for applying for leave,
//! deciding requests, reading balances and maintaining the accrual ledger.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AdjustBalanceRequest, ApplyLeaveRequest, ApproveLeaveRequest, AuditEventsQuery,
    CancelLeaveRequest, ManualAccrualRequest, ProcessAccrualsRequest, ProjectedBalanceQuery,
    RejectLeaveRequest, UpcomingLeavesQuery, UpdateLeaveTypeRequest,
};
pub use response::{ApiError, ApiErrorResponse, ProjectedBalanceResponse};
pub use state::AppState;
