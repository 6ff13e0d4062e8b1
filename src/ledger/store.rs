//! Persistence seams for the ledger.
//!
//! Each collaborator is a `Send + Sync` trait so the ledger can be shared
//! across threads. Implementations report failures as [`StoreError`]; the
//! ledger converts them into retryable [`LedgerError`](crate::error::LedgerError)s.

use thiserror::Error;

use crate::models::{
    AccrualMonth, AuditEntityType, AuditEvent, Employee, EmployeeId, LeaveAccrualRecord,
    LeaveRequest, LeaveRequestId, LeaveStatus, LeaveTypeId, LedgerKey,
};

/// Errors reported by store collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The write would violate a uniqueness constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The entity to update does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("timed out waiting for {operation}")]
    Timeout {
        /// What was being waited on.
        operation: String,
    },
}

/// Durable monthly accrual records, one per (employee, leave type, month).
pub trait AccrualStore: Send + Sync {
    /// Returns the record for `month`, if any.
    fn find(
        &self,
        key: &LedgerKey,
        month: AccrualMonth,
    ) -> Result<Option<LeaveAccrualRecord>, StoreError>;

    /// Returns the record for the most recent month, if any.
    fn latest(&self, key: &LedgerKey) -> Result<Option<LeaveAccrualRecord>, StoreError>;

    /// Returns every record of the ledger, oldest month first.
    fn history(&self, key: &LedgerKey) -> Result<Vec<LeaveAccrualRecord>, StoreError>;

    /// Inserts the record or replaces the one with the same identity.
    fn save(&self, record: LeaveAccrualRecord) -> Result<(), StoreError>;
}

/// Selects leave requests. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Only requests of this employee.
    pub employee_id: Option<EmployeeId>,
    /// Only requests of this leave type.
    pub leave_type_id: Option<LeaveTypeId>,
    /// Only requests in one of these statuses. Empty matches all.
    pub statuses: Vec<LeaveStatus>,
}

impl RequestFilter {
    /// Matches every request.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one employee.
    pub fn for_employee(mut self, employee_id: &EmployeeId) -> Self {
        self.employee_id = Some(employee_id.clone());
        self
    }

    /// Restricts to one leave type.
    pub fn of_type(mut self, leave_type_id: &LeaveTypeId) -> Self {
        self.leave_type_id = Some(leave_type_id.clone());
        self
    }

    /// Restricts to the given statuses.
    pub fn with_statuses(mut self, statuses: &[LeaveStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Returns true if `request` satisfies every set criterion.
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id
            .as_ref()
            .is_none_or(|id| *id == request.employee_id)
            && self
                .leave_type_id
                .as_ref()
                .is_none_or(|id| *id == request.leave_type_id)
            && (self.statuses.is_empty() || self.statuses.contains(&request.status))
    }
}

/// Leave requests and their lifecycle state.
pub trait LeaveRequestStore: Send + Sync {
    /// Stores a new request. Fails with `Conflict` if the id is taken.
    fn insert(&self, request: LeaveRequest) -> Result<(), StoreError>;

    /// Replaces an existing request. Fails with `NotFound` if it is absent.
    fn update(&self, request: LeaveRequest) -> Result<(), StoreError>;

    /// Returns the request, if any.
    fn get(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError>;

    /// Returns matching requests ordered by start date.
    fn list(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError>;
}

/// Read access to the employee profile directory.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the employee, if any.
    fn find(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError>;

    /// Returns every employee.
    fn all(&self) -> Result<Vec<Employee>, StoreError>;
}

/// Selects audit events. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Only events about this entity.
    pub entity_id: Option<String>,
    /// Only events about this kind of entity.
    pub entity_type: Option<AuditEntityType>,
    /// Only events performed by this actor.
    pub performed_by: Option<EmployeeId>,
}

impl AuditFilter {
    /// Returns true if `event` satisfies every set criterion.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        self.entity_id
            .as_ref()
            .is_none_or(|id| *id == event.entity_id)
            && self
                .entity_type
                .is_none_or(|entity_type| entity_type == event.entity_type)
            && self
                .performed_by
                .as_ref()
                .is_none_or(|actor| *actor == event.performed_by)
    }
}

/// Append-only audit log.
pub trait AuditSink: Send + Sync {
    /// Appends an event.
    fn append(&self, event: AuditEvent) -> Result<(), StoreError>;

    /// Returns matching events in chronological order.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, StoreError>;
}
