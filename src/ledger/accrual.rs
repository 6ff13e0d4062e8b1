//! Monthly accrual processing.
//!
//! The processor owns writes to the accrual ledger. Months strictly before
//! the current month are closed: their records are marked processed and never
//! recomputed unless a forced recompute is requested. The current month's
//! record is provisional and is refreshed by every catch-up.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccrualMonth, AccrualPolicy, Employee, LeaveAccrualRecord, LeaveStatus, LeaveType, LedgerKey,
};

use super::clock::Clock;
use super::store::{AccrualStore, LeaveRequestStore, RequestFilter};

/// One accrual-bearing ledger together with the rules that drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerScope {
    /// Which ledger.
    pub key: LedgerKey,
    /// The accrual schedule.
    pub policy: AccrualPolicy,
    /// The first month that accrues: the month after accrual starts.
    pub first_month: AccrualMonth,
}

impl LedgerScope {
    /// Builds the scope of `employee`'s ledger for `leave_type`.
    ///
    /// Fails with `NotAccrualBearing` for flat-allowance types.
    pub fn new(employee: &Employee, leave_type: &LeaveType) -> LedgerResult<Self> {
        if !leave_type.is_accrual_bearing() {
            return Err(LedgerError::NotAccrualBearing {
                leave_type_id: leave_type.id.to_string(),
            });
        }
        let start_month = AccrualMonth::containing(employee.accrual_start_date());
        let first_month = start_month.next().ok_or_else(|| LedgerError::InvalidInput {
            field: "accrual_start_date".to_string(),
            message: format!("no month follows {start_month}"),
        })?;

        Ok(Self {
            key: LedgerKey::new(employee.id.clone(), leave_type.id.clone()),
            policy: leave_type.policy,
            first_month,
        })
    }
}

fn floor_at_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Computes and persists monthly accrual records.
#[derive(Clone)]
pub struct AccrualProcessor {
    accruals: Arc<dyn AccrualStore>,
    requests: Arc<dyn LeaveRequestStore>,
    clock: Arc<dyn Clock>,
}

impl AccrualProcessor {
    /// Creates a processor over the given stores.
    pub fn new(
        accruals: Arc<dyn AccrualStore>,
        requests: Arc<dyn LeaveRequestStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accruals,
            requests,
            clock,
        }
    }

    /// The month the clock currently reads.
    pub fn current_month(&self) -> AccrualMonth {
        AccrualMonth::containing(self.clock.today())
    }

    /// Approved leave days of the ledger's type falling inside `month`.
    pub fn days_used_in_month(&self, key: &LedgerKey, month: AccrualMonth) -> LedgerResult<Decimal> {
        let filter = RequestFilter::all()
            .for_employee(&key.employee_id)
            .of_type(&key.leave_type_id)
            .with_statuses(&[LeaveStatus::Approved]);

        let days: i64 = self
            .requests
            .list(&filter)?
            .iter()
            .map(|request| month.days_overlapping(request.start_date, request.end_date))
            .sum();

        Ok(Decimal::from(days))
    }

    /// Derives the record for `month` from the previous month's balance.
    ///
    /// Manual adjustments, notes and the original close time of `existing`
    /// carry over.
    fn compute(
        &self,
        scope: &LedgerScope,
        month: AccrualMonth,
        existing: Option<&LeaveAccrualRecord>,
    ) -> LedgerResult<LeaveAccrualRecord> {
        let previous_balance = match month.previous() {
            Some(previous) => self
                .accruals
                .find(&scope.key, previous)?
                .map(|record| record.days_balance)
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };

        let days_accrued = if month >= scope.first_month {
            scope.policy.monthly_accrual(previous_balance)
        } else {
            Decimal::ZERO
        };
        let days_adjusted = existing
            .map(|record| record.days_adjusted)
            .unwrap_or(Decimal::ZERO);
        let days_used = self.days_used_in_month(&scope.key, month)?;
        let days_balance = previous_balance
            .checked_add(days_accrued)
            .and_then(|total| total.checked_add(days_adjusted))
            .and_then(|total| total.checked_sub(days_used))
            .map(floor_at_zero)
            .ok_or_else(|| LedgerError::InvalidInput {
                field: "days_adjusted".to_string(),
                message: format!("balance for {month} is out of range"),
            })?;

        let is_processed = month < self.current_month();
        let processed_at = if is_processed {
            existing
                .and_then(|record| record.processed_at)
                .or_else(|| Some(self.clock.now()))
        } else {
            None
        };

        Ok(LeaveAccrualRecord {
            employee_id: scope.key.employee_id.clone(),
            leave_type_id: scope.key.leave_type_id.clone(),
            accrual_month: month,
            days_accrued,
            days_adjusted,
            days_used,
            days_balance,
            is_processed,
            processed_at,
            notes: existing.and_then(|record| record.notes.clone()),
        })
    }

    /// Computes and stores the record for `month`.
    ///
    /// A processed record is returned unchanged. A provisional record whose
    /// figures have not moved is not rewritten.
    pub fn process_month(
        &self,
        scope: &LedgerScope,
        month: AccrualMonth,
    ) -> LedgerResult<LeaveAccrualRecord> {
        let existing = self.accruals.find(&scope.key, month)?;
        if let Some(record) = &existing {
            if record.is_processed {
                return Ok(record.clone());
            }
        }

        let computed = self.compute(scope, month, existing.as_ref())?;
        if let Some(record) = existing {
            if record.same_figures(&computed) {
                return Ok(record);
            }
        }

        self.accruals.save(computed.clone())?;
        debug!(
            ledger = %scope.key,
            month = %month,
            accrued = %computed.days_accrued,
            used = %computed.days_used,
            balance = %computed.days_balance,
            closed = computed.is_processed,
            "Accrual month processed"
        );
        Ok(computed)
    }

    /// Processes every outstanding month through `last`, inclusive.
    ///
    /// Resumes after the last closed record. Returns the record for `last`,
    /// or `None` when accrual has not begun by then.
    pub fn ensure_through(
        &self,
        scope: &LedgerScope,
        last: AccrualMonth,
    ) -> LedgerResult<Option<LeaveAccrualRecord>> {
        let resume_from = match self.accruals.latest(&scope.key)? {
            Some(record) if record.is_processed => record.accrual_month.next(),
            Some(record) => Some(record.accrual_month),
            None => Some(scope.first_month),
        };

        if let Some(start) = resume_from {
            for month in start.through(last) {
                self.process_month(scope, month)?;
            }
        }

        Ok(self.accruals.find(&scope.key, last)?)
    }

    /// Brings the ledger up to date through the current month.
    pub fn ensure_up_to_date(
        &self,
        scope: &LedgerScope,
    ) -> LedgerResult<Option<LeaveAccrualRecord>> {
        self.ensure_through(scope, self.current_month())
    }

    /// Recomputes every stored record from `from` onwards, oldest first.
    ///
    /// Closed records are rewritten too. `note` is appended to each record
    /// whose figures change. Returns the rewritten records.
    pub fn recompute_from(
        &self,
        scope: &LedgerScope,
        from: AccrualMonth,
        note: Option<&str>,
    ) -> LedgerResult<Vec<LeaveAccrualRecord>> {
        let mut rewritten = Vec::new();
        for record in self.accruals.history(&scope.key)? {
            if record.accrual_month < from {
                continue;
            }
            let mut recomputed = self.compute(scope, record.accrual_month, Some(&record))?;
            if recomputed.same_figures(&record) {
                continue;
            }
            if let Some(note) = note {
                recomputed.append_note(note);
            }
            self.accruals.save(recomputed.clone())?;
            rewritten.push(recomputed);
        }

        if !rewritten.is_empty() {
            info!(
                ledger = %scope.key,
                from = %from,
                records = rewritten.len(),
                "Accrual ledger recomputed"
            );
        }
        Ok(rewritten)
    }

    /// Adds `days` to the manual adjustments of `month` and re-chains the
    /// ledger from there.
    ///
    /// Creates the month's record when it does not exist yet.
    pub fn apply_adjustment(
        &self,
        scope: &LedgerScope,
        month: AccrualMonth,
        days: Decimal,
        note: &str,
    ) -> LedgerResult<LeaveAccrualRecord> {
        let mut adjusted = match self.accruals.find(&scope.key, month)? {
            Some(record) => record,
            None => self.compute(scope, month, None)?,
        };
        adjusted.days_adjusted = adjusted
            .days_adjusted
            .checked_add(days)
            .ok_or_else(|| LedgerError::InvalidInput {
                field: "days".to_string(),
                message: format!("adjustment of {days} is out of range"),
            })?;

        // Nothing is written until the month's new figures are known to hold.
        let mut record = self.compute(scope, month, Some(&adjusted))?;
        record.append_note(note);
        self.accruals.save(record.clone())?;
        if let Some(next) = month.next() {
            self.recompute_from(scope, next, None)?;
        }

        let updated = self.accruals.find(&scope.key, month)?.unwrap_or(record);
        info!(
            ledger = %scope.key,
            month = %month,
            days = %days,
            balance = %updated.days_balance,
            "Manual accrual change applied"
        );
        Ok(updated)
    }
}
