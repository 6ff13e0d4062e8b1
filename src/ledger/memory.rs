//! In-memory store implementations.
//!
//! Used by the binary and by tests. Data lives for the life of the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::models::{
    AccrualMonth, AuditEvent, Employee, EmployeeId, LeaveAccrualRecord, LeaveRequest,
    LeaveRequestId, LedgerKey,
};

use super::store::{
    AccrualStore, AuditFilter, AuditSink, EmployeeDirectory, LeaveRequestStore, RequestFilter,
    StoreError,
};

fn poisoned(store: &str) -> StoreError {
    StoreError::Unavailable(format!("{store} lock poisoned"))
}

/// In-memory accrual ledger.
#[derive(Debug, Default)]
pub struct InMemoryAccrualStore {
    records: RwLock<BTreeMap<LedgerKey, BTreeMap<AccrualMonth, LeaveAccrualRecord>>>,
}

impl InMemoryAccrualStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccrualStore for InMemoryAccrualStore {
    fn find(
        &self,
        key: &LedgerKey,
        month: AccrualMonth,
    ) -> Result<Option<LeaveAccrualRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("accrual"))?;
        Ok(records
            .get(key)
            .and_then(|months| months.get(&month))
            .cloned())
    }

    fn latest(&self, key: &LedgerKey) -> Result<Option<LeaveAccrualRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("accrual"))?;
        Ok(records
            .get(key)
            .and_then(|months| months.values().next_back())
            .cloned())
    }

    fn history(&self, key: &LedgerKey) -> Result<Vec<LeaveAccrualRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("accrual"))?;
        Ok(records
            .get(key)
            .map(|months| months.values().cloned().collect())
            .unwrap_or_default())
    }

    fn save(&self, record: LeaveAccrualRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned("accrual"))?;
        records
            .entry(record.key())
            .or_default()
            .insert(record.accrual_month, record);
        Ok(())
    }
}

/// In-memory leave request store.
#[derive(Debug, Default)]
pub struct InMemoryLeaveRequestStore {
    requests: RwLock<HashMap<LeaveRequestId, LeaveRequest>>,
}

impl InMemoryLeaveRequestStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaveRequestStore for InMemoryLeaveRequestStore {
    fn insert(&self, request: LeaveRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.write().map_err(|_| poisoned("leave request"))?;
        if requests.contains_key(&request.id) {
            return Err(StoreError::Conflict(format!(
                "leave request '{}' already exists",
                request.id
            )));
        }
        requests.insert(request.id, request);
        Ok(())
    }

    fn update(&self, request: LeaveRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.write().map_err(|_| poisoned("leave request"))?;
        match requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "leave request '{}'",
                request.id
            ))),
        }
    }

    fn get(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        let requests = self.requests.read().map_err(|_| poisoned("leave request"))?;
        Ok(requests.get(&id).cloned())
    }

    fn list(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let requests = self.requests.read().map_err(|_| poisoned("leave request"))?;
        let mut matching: Vec<LeaveRequest> = requests
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(matching)
    }
}

/// In-memory employee directory.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<BTreeMap<EmployeeId, Employee>>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding `employees`.
    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let directory = Self::new();
        for employee in employees {
            directory.upsert(employee);
        }
        directory
    }

    /// Adds or replaces an employee.
    pub fn upsert(&self, employee: Employee) {
        let mut employees = self.employees.write().unwrap_or_else(|e| e.into_inner());
        employees.insert(employee.id.clone(), employee);
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn find(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError> {
        let employees = self.employees.read().map_err(|_| poisoned("employee"))?;
        Ok(employees.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Employee>, StoreError> {
        let employees = self.employees.read().map_err(|_| poisoned("employee"))?;
        Ok(employees.values().cloned().collect())
    }
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, event: AuditEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| poisoned("audit"))?;
        events.push(event);
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, StoreError> {
        let events = self.events.read().map_err(|_| poisoned("audit"))?;
        let mut matching: Vec<AuditEvent> = events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        matching.sort_by_key(|event| event.timestamp);
        Ok(matching)
    }
}
