//! Leave request model and lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeId, LeaveTypeId};

/// Number of calendar days in an inclusive date range.
///
/// Returns zero when `end` precedes `start`.
///
/// # Examples
///
/// ```
/// use leave_ledger::models::inclusive_days;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
/// assert_eq!(inclusive_days(day, day), 1);
/// assert_eq!(inclusive_days(day, NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()), 5);
/// ```
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    (end - start).num_days() + 1
}

/// Identifier of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveRequestId(pub Uuid);

impl LeaveRequestId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LeaveRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LeaveRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a staff decision. Initial state.
    Pending,
    /// Granted; counts against the balance.
    Approved,
    /// Declined by staff. Terminal.
    Rejected,
    /// Withdrawn by the employee. Terminal.
    Cancelled,
}

impl LeaveStatus {
    /// Returns true for statuses that block overlapping requests.
    pub fn is_active(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
            LeaveStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A request for leave over an inclusive range of calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier.
    pub id: LeaveRequestId,
    /// The employee taking leave.
    pub employee_id: EmployeeId,
    /// The category of leave.
    pub leave_type_id: LeaveTypeId,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason given by the employee.
    #[serde(default)]
    pub reason: String,
    /// Current lifecycle status.
    pub status: LeaveStatus,
    /// The staff member who approved or rejected the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<EmployeeId>,
    /// When the decision was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Why the request was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request last changed.
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Creates a new request in the Pending state.
    pub fn pending(
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LeaveRequestId::generate(),
            employee_id,
            leave_type_id,
            start_date,
            end_date,
            reason: reason.into(),
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Duration in days, counting both the start and end date.
    pub fn duration_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }

    /// Duration in days as a decimal for balance arithmetic.
    pub fn duration(&self) -> Decimal {
        Decimal::from(self.duration_days())
    }

    /// Returns true if the request intersects the inclusive range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    /// Number of leave days falling inside the inclusive range.
    pub fn days_within(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        inclusive_days(self.start_date.max(start), self.end_date.min(end))
    }
}
