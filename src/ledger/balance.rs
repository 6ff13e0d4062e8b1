//! Current and projected balances.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::LedgerResult;
use crate::models::{
    AccrualMonth, AccrualPolicy, Employee, Entitlement, LeaveBalance, LeaveRequest, LeaveStatus,
    LeaveType,
};

use super::accrual::{AccrualProcessor, LedgerScope};
use super::clock::Clock;
use super::store::{AccrualStore, LeaveRequestStore, RequestFilter};

/// Derives balances from the accrual ledger and approved requests.
#[derive(Clone)]
pub struct BalanceCalculator {
    processor: AccrualProcessor,
    accruals: Arc<dyn AccrualStore>,
    requests: Arc<dyn LeaveRequestStore>,
    clock: Arc<dyn Clock>,
}

impl BalanceCalculator {
    /// Creates a calculator. Catch-up runs through `processor`.
    pub fn new(
        processor: AccrualProcessor,
        accruals: Arc<dyn AccrualStore>,
        requests: Arc<dyn LeaveRequestStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            processor,
            accruals,
            requests,
            clock,
        }
    }

    fn requests_of(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        statuses: &[LeaveStatus],
    ) -> LedgerResult<Vec<LeaveRequest>> {
        let filter = RequestFilter::all()
            .for_employee(&employee.id)
            .of_type(&leave_type.id)
            .with_statuses(statuses);
        Ok(self.requests.list(&filter)?)
    }

    fn approved_days(&self, employee: &Employee, leave_type: &LeaveType) -> LedgerResult<Decimal> {
        Ok(self
            .requests_of(employee, leave_type, &[LeaveStatus::Approved])?
            .iter()
            .map(LeaveRequest::duration)
            .sum())
    }

    /// Days available now.
    ///
    /// Flat types: the allowance minus approved leave. Accrual-bearing types:
    /// the latest ledger balance after catch-up. Never negative.
    pub fn current_balance(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
    ) -> LedgerResult<Decimal> {
        match leave_type.policy {
            AccrualPolicy::Flat { max_days } => {
                let used = self.approved_days(employee, leave_type)?;
                Ok((max_days - used).max(Decimal::ZERO))
            }
            AccrualPolicy::MonthlyAccrual { .. } => {
                let scope = LedgerScope::new(employee, leave_type)?;
                self.processor.ensure_up_to_date(&scope)?;
                Ok(self
                    .accruals
                    .latest(&scope.key)?
                    .map(|record| record.days_balance)
                    .unwrap_or(Decimal::ZERO))
            }
        }
    }

    /// Balance expected on `target`.
    ///
    /// Months after the current one are simulated with the accrual schedule,
    /// charging every Pending or Approved request that starts on or before
    /// `target`. Pending days up to the current month are charged up front,
    /// and days running past the target month are charged to it.
    ///
    /// Flat types, and targets on or before today, get the current balance.
    pub fn projected_balance(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        target: NaiveDate,
    ) -> LedgerResult<Decimal> {
        let current = self.current_balance(employee, leave_type)?;
        let today = self.clock.today();
        if target <= today || !leave_type.is_accrual_bearing() {
            return Ok(current);
        }

        let outstanding = self.requests_of(
            employee,
            leave_type,
            &[LeaveStatus::Pending, LeaveStatus::Approved],
        )?;
        let balance = project(leave_type, today, target, current, &outstanding);

        debug!(
            employee_id = %employee.id,
            leave_type_id = %leave_type.id,
            target = %target,
            current = %current,
            projected = %balance,
            "Projected balance computed"
        );
        Ok(balance)
    }

    /// Days a new request starting on `start` may take.
    ///
    /// Accrual-bearing requests starting after today are held to the
    /// projected balance on `start`, everything else to the current balance.
    /// Either way the figure is capped by the projection at the start of every
    /// later Pending or Approved request, so booked leave is never spent twice.
    pub fn available_for_application(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        start: NaiveDate,
    ) -> LedgerResult<Decimal> {
        let current = self.current_balance(employee, leave_type)?;
        let today = self.clock.today();
        if !leave_type.is_accrual_bearing() {
            return Ok(current);
        }

        let outstanding = self.requests_of(
            employee,
            leave_type,
            &[LeaveStatus::Pending, LeaveStatus::Approved],
        )?;
        let base = if start > today {
            project(leave_type, today, start, current, &outstanding)
        } else {
            current
        };
        Ok(bounded_by_commitments(leave_type, today, start, current, base, &outstanding))
    }

    /// Days `request` may take when it is approved.
    ///
    /// The current balance, capped by the projection at the start of every
    /// Approved request that begins on or after `request`.
    pub fn available_for_approval(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        request: &LeaveRequest,
    ) -> LedgerResult<Decimal> {
        let current = self.current_balance(employee, leave_type)?;
        if !leave_type.is_accrual_bearing() {
            return Ok(current);
        }

        let approved: Vec<LeaveRequest> = self
            .requests_of(employee, leave_type, &[LeaveStatus::Approved])?
            .into_iter()
            .filter(|other| other.id != request.id)
            .collect();
        Ok(bounded_by_commitments(
            leave_type,
            self.clock.today(),
            request.start_date,
            current,
            current,
            &approved,
        ))
    }

    /// Full balance view for one leave type.
    pub fn balance_view(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
    ) -> LedgerResult<LeaveBalance> {
        let balance = self.current_balance(employee, leave_type)?;

        let (entitlement, used_days) = match leave_type.policy {
            AccrualPolicy::Flat { max_days } => (
                Entitlement::Allowance { max_days },
                self.approved_days(employee, leave_type)?,
            ),
            AccrualPolicy::MonthlyAccrual { .. } => {
                let scope = LedgerScope::new(employee, leave_type)?;
                let history = self.accruals.history(&scope.key)?;
                let accrued_to_date: Decimal = history
                    .iter()
                    .map(|record| record.days_accrued + record.days_adjusted)
                    .sum();
                let used: Decimal = history.iter().map(|record| record.days_used).sum();
                (Entitlement::Accrued { accrued_to_date }, used)
            }
        };

        let today = self.clock.today();
        let pending_requests = self.requests_of(employee, leave_type, &[LeaveStatus::Pending])?;
        let upcoming_leaves = self
            .requests_of(employee, leave_type, &[LeaveStatus::Approved])?
            .into_iter()
            .filter(|request| request.start_date > today)
            .collect();

        Ok(LeaveBalance {
            employee_id: employee.id.clone(),
            leave_type_id: leave_type.id.clone(),
            leave_type_name: leave_type.name.clone(),
            entitlement,
            used_days,
            balance,
            pending_requests,
            upcoming_leaves,
        })
    }
}

/// Simulates the ledger from `current` up to `target`.
///
/// Approved days inside the current month are already part of `current`
/// through the provisional record, whatever their start date. Only Pending
/// days are charged for the running month.
fn project(
    leave_type: &LeaveType,
    today: NaiveDate,
    target: NaiveDate,
    current: Decimal,
    outstanding: &[LeaveRequest],
) -> Decimal {
    let current_month = AccrualMonth::containing(today);
    let target_month = AccrualMonth::containing(target);
    let charged: Vec<&LeaveRequest> = outstanding
        .iter()
        .filter(|request| request.start_date <= target)
        .collect();

    let days_in = |from: NaiveDate, to: NaiveDate, pending_only: bool| -> Decimal {
        let days: i64 = charged
            .iter()
            .filter(|request| !pending_only || request.status == LeaveStatus::Pending)
            .map(|request| request.days_within(from, to))
            .sum();
        Decimal::from(days)
    };

    let mut balance =
        (current - days_in(NaiveDate::MIN, current_month.last_day(), true)).max(Decimal::ZERO);

    if let Some(next) = current_month.next() {
        for month in next.through(target_month) {
            let accrued = leave_type.policy.monthly_accrual(balance);
            let used = days_in(month.first_day(), month.last_day(), false);
            balance = (balance + accrued - used).max(Decimal::ZERO);
        }
    }

    if let Some(after_target) = target_month.last_day().succ_opt() {
        balance = (balance - days_in(after_target, NaiveDate::MAX, false)).max(Decimal::ZERO);
    }
    balance
}

/// Lowers `base` to the projected balance at the start of each commitment
/// beginning on or after `start` and after today.
fn bounded_by_commitments(
    leave_type: &LeaveType,
    today: NaiveDate,
    start: NaiveDate,
    current: Decimal,
    base: Decimal,
    commitments: &[LeaveRequest],
) -> Decimal {
    commitments
        .iter()
        .map(|request| request.start_date)
        .filter(|checkpoint| *checkpoint >= start && *checkpoint > today)
        .map(|checkpoint| project(leave_type, today, checkpoint, current, commitments))
        .fold(base, Decimal::min)
}
