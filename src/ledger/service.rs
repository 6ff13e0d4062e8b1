//! The leave ledger facade.
//!
//! [`LeaveLedger`] ties the registry, stores, accrual processor, balance
//! calculator and audit recorder together and exposes the lifecycle and
//! ledger operations. Every balance-affecting operation holds the employee's
//! ledger lock around its read-decide-write sequence.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::LedgerSettings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccrualBatchError, AccrualBatchReport, AccrualMonth, AuditAction, AuditEntityType, AuditEvent,
    Employee, EmployeeId, LeaveAccrualRecord, LeaveBalance, LeaveRequest, LeaveRequestId,
    LeaveStatus, LeaveType, LeaveTypeId,
};

use super::accrual::{AccrualProcessor, LedgerScope};
use super::audit::{AuditEntry, AuditRecorder};
use super::balance::BalanceCalculator;
use super::clock::Clock;
use super::locks::{KeyGuard, KeyedLocks};
use super::memory::{
    InMemoryAccrualStore, InMemoryAuditLog, InMemoryEmployeeDirectory, InMemoryLeaveRequestStore,
};
use super::overlap::OverlapValidator;
use super::registry::LeaveTypeRegistry;
use super::store::{
    AccrualStore, AuditFilter, AuditSink, EmployeeDirectory, LeaveRequestStore, RequestFilter,
};

/// The collaborators a ledger reads from and writes to.
#[derive(Clone)]
pub struct LedgerStores {
    /// Employee profiles.
    pub employees: Arc<dyn EmployeeDirectory>,
    /// Leave requests.
    pub requests: Arc<dyn LeaveRequestStore>,
    /// Monthly accrual records.
    pub accruals: Arc<dyn AccrualStore>,
    /// Audit log.
    pub audit: Arc<dyn AuditSink>,
}

impl LedgerStores {
    /// In-memory stores around the given employee directory.
    pub fn in_memory(employees: InMemoryEmployeeDirectory) -> Self {
        Self {
            employees: Arc::new(employees),
            requests: Arc::new(InMemoryLeaveRequestStore::new()),
            accruals: Arc::new(InMemoryAccrualStore::new()),
            audit: Arc::new(InMemoryAuditLog::new()),
        }
    }
}

fn signed(days: Decimal) -> String {
    if days.is_sign_positive() {
        format!("+{days}")
    } else {
        days.to_string()
    }
}

fn required_text<'a>(field: &str, value: &'a str) -> LedgerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(trimmed)
}

/// Largest manual change, either way, accepted in one call.
const MAX_ADJUSTMENT_DAYS: i64 = 366;

fn within_adjustment_limit(days: Decimal) -> LedgerResult<()> {
    if days.abs() > Decimal::from(MAX_ADJUSTMENT_DAYS) {
        return Err(LedgerError::InvalidInput {
            field: "days".to_string(),
            message: format!("{days} exceeds the limit of {MAX_ADJUSTMENT_DAYS} days"),
        });
    }
    Ok(())
}

/// Leave entitlement ledger and request lifecycle.
pub struct LeaveLedger {
    registry: LeaveTypeRegistry,
    employees: Arc<dyn EmployeeDirectory>,
    requests: Arc<dyn LeaveRequestStore>,
    accruals: Arc<dyn AccrualStore>,
    clock: Arc<dyn Clock>,
    processor: AccrualProcessor,
    balances: BalanceCalculator,
    overlap: OverlapValidator,
    audit: AuditRecorder,
    locks: KeyedLocks<EmployeeId>,
    settings: LedgerSettings,
}

impl LeaveLedger {
    /// Creates a ledger over the given registry, stores and clock.
    pub fn new(
        registry: LeaveTypeRegistry,
        stores: LedgerStores,
        clock: Arc<dyn Clock>,
        settings: LedgerSettings,
    ) -> Self {
        let processor =
            AccrualProcessor::new(stores.accruals.clone(), stores.requests.clone(), clock.clone());
        let balances = BalanceCalculator::new(
            processor.clone(),
            stores.accruals.clone(),
            stores.requests.clone(),
            clock.clone(),
        );

        Self {
            registry,
            employees: stores.employees,
            requests: stores.requests.clone(),
            accruals: stores.accruals,
            overlap: OverlapValidator::new(stores.requests),
            audit: AuditRecorder::new(stores.audit, clock.clone()),
            locks: KeyedLocks::new(settings.lock_timeout()),
            clock,
            processor,
            balances,
            settings,
        }
    }

    /// The operational settings.
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// The date the ledger considers today.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn employee(&self, employee_id: &EmployeeId) -> LedgerResult<Employee> {
        self.employees
            .find(employee_id)?
            .ok_or_else(|| LedgerError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    fn lock(&self, employee_id: &EmployeeId) -> LedgerResult<KeyGuard<'_, EmployeeId>> {
        Ok(self.locks.acquire(employee_id)?)
    }

    /// Looks up a leave request.
    pub fn get_request(&self, request_id: LeaveRequestId) -> LedgerResult<LeaveRequest> {
        self.requests
            .get(request_id)?
            .ok_or_else(|| LedgerError::RequestNotFound {
                request_id: request_id.to_string(),
            })
    }

    /// Refreshes the employee's ledger after a lifecycle change.
    fn refresh_ledger(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        changed_from: NaiveDate,
        note: &str,
    ) -> LedgerResult<()> {
        if !leave_type.is_accrual_bearing() {
            return Ok(());
        }
        let scope = LedgerScope::new(employee, leave_type)?;
        let from = AccrualMonth::containing(changed_from);
        if from < self.processor.current_month() {
            self.processor.recompute_from(&scope, from, Some(note))?;
        }
        self.processor.ensure_up_to_date(&scope)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Request lifecycle
    // ------------------------------------------------------------------

    /// Applies for leave over `start..=end`.
    ///
    /// Checks run in order: date range, past date, leave type, employee,
    /// overlap, then balance. Accrual-bearing requests starting after today
    /// are checked against the projected balance on the start date, and no
    /// request may eat into days already booked for later leave.
    pub fn apply_leave(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
        start: NaiveDate,
        end: NaiveDate,
        reason: &str,
    ) -> LedgerResult<LeaveRequest> {
        if start > end {
            return Err(LedgerError::InvalidDateRange { start, end });
        }
        let today = self.clock.today();
        if start < today {
            return Err(LedgerError::PastDate { start, today });
        }
        let leave_type = self.registry.get(leave_type_id)?;
        let employee = self.employee(employee_id)?;

        let _guard = self.lock(employee_id)?;

        if self.overlap.has_overlap(employee_id, start, end, None)? {
            return Err(LedgerError::Overlap {
                employee_id: employee_id.to_string(),
                start,
                end,
            });
        }

        let available = self
            .balances
            .available_for_application(&employee, &leave_type, start)?;

        let request = LeaveRequest::pending(
            employee.id.clone(),
            leave_type.id.clone(),
            start,
            end,
            reason.trim(),
            self.clock.now(),
        );
        if request.duration() > available {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: request.duration(),
            });
        }

        self.requests.insert(request.clone())?;
        info!(
            request_id = %request.id,
            employee_id = %employee_id,
            leave_type_id = %leave_type_id,
            start = %start,
            end = %end,
            days = request.duration_days(),
            "Leave request created"
        );

        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveRequest,
                request.id.to_string(),
                AuditAction::Create,
                employee_id,
            )
            .new_value(&request),
        );
        Ok(request)
    }

    /// Approves a pending request after re-checking the current balance
    /// against leave already approved for later dates.
    pub fn approve_leave(
        &self,
        request_id: LeaveRequestId,
        approver: &EmployeeId,
    ) -> LedgerResult<LeaveRequest> {
        let owner = self.get_request(request_id)?.employee_id;
        let _guard = self.lock(&owner)?;

        let request = self.get_request(request_id)?;
        if request.status != LeaveStatus::Pending {
            return Err(LedgerError::NotPending {
                request_id: request_id.to_string(),
                status: request.status,
            });
        }

        let leave_type = self.registry.get(&request.leave_type_id)?;
        let employee = self.employee(&request.employee_id)?;
        let available = self
            .balances
            .available_for_approval(&employee, &leave_type, &request)?;
        if request.duration() > available {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: request.duration(),
            });
        }

        let now = self.clock.now();
        let mut approved = request.clone();
        approved.status = LeaveStatus::Approved;
        approved.approved_by = Some(approver.clone());
        approved.approved_at = Some(now);
        approved.updated_at = now;
        self.requests.update(approved.clone())?;

        self.refresh_ledger(
            &employee,
            &leave_type,
            approved.start_date,
            &format!("Recomputed after approval of leave request {request_id}"),
        )?;

        info!(
            request_id = %request_id,
            employee_id = %approved.employee_id,
            approver = %approver,
            "Leave request approved"
        );
        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveRequest,
                request_id.to_string(),
                AuditAction::Approve,
                approver,
            )
            .old_value(&request)
            .new_value(&approved),
        );
        Ok(approved)
    }

    /// Rejects a pending request. A non-empty reason is required.
    pub fn reject_leave(
        &self,
        request_id: LeaveRequestId,
        approver: &EmployeeId,
        reason: &str,
    ) -> LedgerResult<LeaveRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::MissingReason);
        }

        let owner = self.get_request(request_id)?.employee_id;
        let _guard = self.lock(&owner)?;

        let request = self.get_request(request_id)?;
        if request.status != LeaveStatus::Pending {
            return Err(LedgerError::NotPending {
                request_id: request_id.to_string(),
                status: request.status,
            });
        }

        let now = self.clock.now();
        let mut rejected = request.clone();
        rejected.status = LeaveStatus::Rejected;
        rejected.approved_by = Some(approver.clone());
        rejected.approved_at = Some(now);
        rejected.rejection_reason = Some(reason.to_string());
        rejected.updated_at = now;
        self.requests.update(rejected.clone())?;

        info!(
            request_id = %request_id,
            employee_id = %rejected.employee_id,
            approver = %approver,
            "Leave request rejected"
        );
        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveRequest,
                request_id.to_string(),
                AuditAction::Reject,
                approver,
            )
            .old_value(&request)
            .new_value(&rejected)
            .comment(reason),
        );
        Ok(rejected)
    }

    /// Cancels the employee's own request.
    ///
    /// Pending requests can always be cancelled. Approved requests only while
    /// their start date is still in the future.
    pub fn cancel_leave(
        &self,
        request_id: LeaveRequestId,
        employee_id: &EmployeeId,
    ) -> LedgerResult<LeaveRequest> {
        let owner = self.get_request(request_id)?.employee_id;
        let _guard = self.lock(&owner)?;

        let request = self.get_request(request_id)?;
        if request.employee_id != *employee_id {
            return Err(LedgerError::NotOwner {
                request_id: request_id.to_string(),
                employee_id: employee_id.to_string(),
            });
        }
        match request.status {
            LeaveStatus::Pending => {}
            LeaveStatus::Approved if request.start_date > self.clock.today() => {}
            LeaveStatus::Approved => {
                return Err(LedgerError::AlreadyStarted {
                    request_id: request_id.to_string(),
                    start_date: request.start_date,
                });
            }
            status => {
                return Err(LedgerError::NotCancellable {
                    request_id: request_id.to_string(),
                    status,
                });
            }
        }

        let mut cancelled = request.clone();
        cancelled.status = LeaveStatus::Cancelled;
        cancelled.updated_at = self.clock.now();
        self.requests.update(cancelled.clone())?;

        if request.status == LeaveStatus::Approved {
            let leave_type = self.registry.get(&request.leave_type_id)?;
            let employee = self.employee(&request.employee_id)?;
            self.refresh_ledger(
                &employee,
                &leave_type,
                request.start_date,
                &format!("Recomputed after cancellation of leave request {request_id}"),
            )?;
        }

        info!(
            request_id = %request_id,
            employee_id = %employee_id,
            previous_status = %request.status,
            "Leave request cancelled"
        );
        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveRequest,
                request_id.to_string(),
                AuditAction::Cancel,
                employee_id,
            )
            .old_value(&request)
            .new_value(&cancelled),
        );
        Ok(cancelled)
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// The employee's balance view for one leave type.
    pub fn get_balance(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
    ) -> LedgerResult<LeaveBalance> {
        let leave_type = self.registry.get(leave_type_id)?;
        let employee = self.employee(employee_id)?;
        let _guard = self.lock(employee_id)?;
        self.balances.balance_view(&employee, &leave_type)
    }

    /// The employee's balance views for every leave type.
    pub fn balances_for_employee(&self, employee_id: &EmployeeId) -> LedgerResult<Vec<LeaveBalance>> {
        let employee = self.employee(employee_id)?;
        let _guard = self.lock(employee_id)?;
        self.registry
            .all()
            .iter()
            .map(|leave_type| self.balances.balance_view(&employee, leave_type))
            .collect()
    }

    /// The balance expected on `date`.
    pub fn get_projected_balance(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
        date: NaiveDate,
    ) -> LedgerResult<Decimal> {
        let leave_type = self.registry.get(leave_type_id)?;
        let employee = self.employee(employee_id)?;
        let _guard = self.lock(employee_id)?;
        self.balances.projected_balance(&employee, &leave_type, date)
    }

    // ------------------------------------------------------------------
    // Accrual ledger
    // ------------------------------------------------------------------

    fn scope(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
    ) -> LedgerResult<LedgerScope> {
        let leave_type = self.registry.get(leave_type_id)?;
        let employee = self.employee(employee_id)?;
        LedgerScope::new(&employee, &leave_type)
    }

    /// Every monthly record of the ledger after catch-up, oldest first.
    pub fn accrual_history(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
    ) -> LedgerResult<Vec<LeaveAccrualRecord>> {
        let scope = self.scope(employee_id, leave_type_id)?;
        let _guard = self.lock(employee_id)?;
        self.processor.ensure_up_to_date(&scope)?;
        Ok(self.accruals.history(&scope.key)?)
    }

    /// Brings every employee's accrual-bearing ledgers up to date through
    /// `month`.
    ///
    /// Employees whose accrual has not begun by `month` are skipped. A failure
    /// for one employee is reported and never aborts the batch. Re-running a
    /// month is harmless.
    pub fn process_accruals_for_month(
        &self,
        month: AccrualMonth,
        performed_by: &EmployeeId,
    ) -> LedgerResult<AccrualBatchReport> {
        let current = self.processor.current_month();
        if month > current {
            return Err(LedgerError::InvalidInput {
                field: "month".to_string(),
                message: format!("{month} is in the future (current month is {current})"),
            });
        }

        let leave_types = self.registry.accrual_bearing();
        let mut report = AccrualBatchReport::new(month);

        for employee in self.employees.all()? {
            let first_month =
                AccrualMonth::containing(employee.accrual_start_date()).next();
            if first_month.is_none_or(|first| month < first) {
                report.skipped += 1;
                continue;
            }

            match self.accrue_employee(&employee, &leave_types, month) {
                Ok(()) => report.processed += 1,
                Err(error) => {
                    warn!(
                        employee_id = %employee.id,
                        month = %month,
                        error = %error,
                        "Accrual processing failed for employee"
                    );
                    report.errors.push(AccrualBatchError {
                        employee_id: employee.id.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        info!(
            month = %month,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.errors.len(),
            "Batch accrual finished"
        );
        self.audit.record(
            AuditEntry::new(
                AuditEntityType::AccrualBatch,
                month.to_string(),
                AuditAction::Create,
                performed_by,
            )
            .new_value(&report),
        );
        Ok(report)
    }

    fn accrue_employee(
        &self,
        employee: &Employee,
        leave_types: &[LeaveType],
        month: AccrualMonth,
    ) -> LedgerResult<()> {
        let _guard = self.lock(&employee.id)?;
        for leave_type in leave_types {
            let scope = LedgerScope::new(employee, leave_type)?;
            self.processor.ensure_through(&scope, month)?;
        }
        Ok(())
    }

    /// Adds a signed manual adjustment to the latest month of the ledger.
    ///
    /// When the ledger has no record yet, one is opened for the current
    /// month.
    pub fn adjust_balance(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
        days: Decimal,
        reason: &str,
        performed_by: &EmployeeId,
    ) -> LedgerResult<LeaveAccrualRecord> {
        let reason = required_text("reason", reason)?;
        if days.is_zero() {
            return Err(LedgerError::InvalidInput {
                field: "days".to_string(),
                message: "adjustment must not be zero".to_string(),
            });
        }
        within_adjustment_limit(days)?;
        let scope = self.scope(employee_id, leave_type_id)?;
        let _guard = self.lock(employee_id)?;

        self.processor.ensure_up_to_date(&scope)?;
        let month = self
            .accruals
            .latest(&scope.key)?
            .map(|record| record.accrual_month)
            .unwrap_or_else(|| self.processor.current_month());
        let before = self.accruals.find(&scope.key, month)?;

        let note = format!("Manual adjustment: {} days ({reason})", signed(days));
        let record = self.processor.apply_adjustment(&scope, month, days, &note)?;

        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveAccrual,
                format!("{}/{}", scope.key, month),
                AuditAction::Update,
                performed_by,
            )
            .old_value(&before)
            .new_value(&record)
            .comment(reason),
        );
        Ok(record)
    }

    /// Credits extra days to a past or current month and re-chains the
    /// later months.
    pub fn add_manual_accrual(
        &self,
        employee_id: &EmployeeId,
        leave_type_id: &LeaveTypeId,
        month: AccrualMonth,
        days: Decimal,
        reason: &str,
        performed_by: &EmployeeId,
    ) -> LedgerResult<LeaveAccrualRecord> {
        let reason = required_text("reason", reason)?;
        if days <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput {
                field: "days".to_string(),
                message: format!("manual accrual must be positive, got {days}"),
            });
        }
        within_adjustment_limit(days)?;
        let current = self.processor.current_month();
        if month > current {
            return Err(LedgerError::InvalidInput {
                field: "month".to_string(),
                message: format!("{month} is in the future (current month is {current})"),
            });
        }
        let scope = self.scope(employee_id, leave_type_id)?;
        if month < scope.first_month {
            return Err(LedgerError::InvalidInput {
                field: "month".to_string(),
                message: format!("{month} precedes the start of accrual ({})", scope.first_month),
            });
        }
        let _guard = self.lock(employee_id)?;

        self.processor.ensure_up_to_date(&scope)?;
        let before = self.accruals.find(&scope.key, month)?;
        let note = format!("Manual accrual: {} days ({reason})", signed(days));
        let record = self.processor.apply_adjustment(&scope, month, days, &note)?;

        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveAccrual,
                format!("{}/{}", scope.key, month),
                AuditAction::Create,
                performed_by,
            )
            .old_value(&before)
            .new_value(&record)
            .comment(reason),
        );
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every request of the employee, ordered by start date.
    pub fn employee_requests(&self, employee_id: &EmployeeId) -> LedgerResult<Vec<LeaveRequest>> {
        self.employee(employee_id)?;
        Ok(self
            .requests
            .list(&RequestFilter::all().for_employee(employee_id))?)
    }

    /// Every request awaiting a decision, ordered by start date.
    pub fn pending_requests(&self) -> LedgerResult<Vec<LeaveRequest>> {
        Ok(self
            .requests
            .list(&RequestFilter::all().with_statuses(&[LeaveStatus::Pending]))?)
    }

    /// Approved leave starting within `window_days` from today.
    ///
    /// Falls back to the configured window when none is given.
    pub fn upcoming_leaves(&self, window_days: Option<u32>) -> LedgerResult<Vec<LeaveRequest>> {
        let today = self.clock.today();
        let window = window_days.unwrap_or(self.settings.upcoming_window_days);
        let horizon = today
            .checked_add_signed(Duration::days(i64::from(window)))
            .unwrap_or(NaiveDate::MAX);
        Ok(self
            .requests
            .list(&RequestFilter::all().with_statuses(&[LeaveStatus::Approved]))?
            .into_iter()
            .filter(|request| request.start_date >= today && request.start_date <= horizon)
            .collect())
    }

    /// The audit trail of one request, oldest first.
    pub fn request_audit_trail(&self, request_id: LeaveRequestId) -> LedgerResult<Vec<AuditEvent>> {
        self.get_request(request_id)?;
        self.audit.events(&AuditFilter {
            entity_id: Some(request_id.to_string()),
            entity_type: Some(AuditEntityType::LeaveRequest),
            performed_by: None,
        })
    }

    /// Audit events matching `filter`, oldest first.
    pub fn audit_events(&self, filter: &AuditFilter) -> LedgerResult<Vec<AuditEvent>> {
        self.audit.events(filter)
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// The leave type catalog.
    pub fn leave_types(&self) -> Vec<LeaveType> {
        self.registry.all()
    }

    /// Renames a leave type or changes its flat allowance.
    pub fn update_leave_type(
        &self,
        leave_type_id: &LeaveTypeId,
        name: Option<String>,
        max_days: Option<Decimal>,
        performed_by: &EmployeeId,
    ) -> LedgerResult<LeaveType> {
        let before = self.registry.get(leave_type_id)?;
        let updated = self
            .registry
            .update_leave_type(leave_type_id, name, max_days)?;

        self.audit.record(
            AuditEntry::new(
                AuditEntityType::LeaveType,
                leave_type_id.to_string(),
                AuditAction::Update,
                performed_by,
            )
            .old_value(&before)
            .new_value(&updated),
        );
        Ok(updated)
    }
}
