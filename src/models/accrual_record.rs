//! Monthly accrual ledger records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::leave_request::inclusive_days;
use super::{EmployeeId, LeaveTypeId};

/// A calendar month, stored as its first day.
///
/// Serializes as `"YYYY-MM"`. Parsing also accepts a full `"YYYY-MM-DD"` date,
/// which is normalized to the month containing it.
///
/// # Examples
///
/// ```
/// use leave_ledger::models::AccrualMonth;
///
/// let month: AccrualMonth = "2024-02-17".parse().unwrap();
/// assert_eq!(month.to_string(), "2024-02");
/// assert_eq!(month.last_day().to_string(), "2024-02-29");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccrualMonth(NaiveDate);

impl AccrualMonth {
    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Builds a month from a year and a 1-based month number.
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The first day of the month.
    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    /// The last day of the month.
    pub fn last_day(self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// The following month.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// The preceding month.
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub_months(Months::new(1)).map(Self)
    }

    /// Iterates from this month through `last`, inclusive.
    ///
    /// Yields nothing when `last` precedes this month.
    pub fn through(self, last: AccrualMonth) -> impl Iterator<Item = AccrualMonth> {
        std::iter::successors(Some(self), |month| month.next()).take_while(move |m| *m <= last)
    }

    /// Returns true if `date` falls inside the month.
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::containing(date) == self
    }

    /// Number of days of the inclusive range that fall inside the month.
    pub fn days_overlapping(self, start: NaiveDate, end: NaiveDate) -> i64 {
        inclusive_days(start.max(self.first_day()), end.min(self.last_day()))
    }
}

impl fmt::Display for AccrualMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

impl FromStr for AccrualMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::containing(date));
        }
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| format!("expected a month as YYYY-MM, got '{s}'"))
    }
}

impl TryFrom<String> for AccrualMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccrualMonth> for String {
    fn from(month: AccrualMonth) -> Self {
        month.to_string()
    }
}

/// Identity of one employee's ledger for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The accrual-bearing leave type.
    pub leave_type_id: LeaveTypeId,
}

impl LedgerKey {
    /// Creates a key.
    pub fn new(employee_id: EmployeeId, leave_type_id: LeaveTypeId) -> Self {
        Self {
            employee_id,
            leave_type_id,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.employee_id, self.leave_type_id)
    }
}

/// One month of one employee's accrual ledger for one leave type.
///
/// Each record chains from the previous month's `days_balance`:
/// `days_balance = max(0, previous + days_accrued + days_adjusted - days_used)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAccrualRecord {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The accrual-bearing leave type.
    pub leave_type_id: LeaveTypeId,
    /// The month this record covers.
    pub accrual_month: AccrualMonth,
    /// Days credited by the monthly schedule.
    pub days_accrued: Decimal,
    /// Signed sum of manual adjustments and manual accruals.
    pub days_adjusted: Decimal,
    /// Approved leave days falling inside the month.
    pub days_used: Decimal,
    /// Balance carried out of the month. Never negative.
    pub days_balance: Decimal,
    /// Closed months are processed and immutable.
    pub is_processed: bool,
    /// When the month was closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// Audit notes for manual changes, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LeaveAccrualRecord {
    /// Returns the ledger this record belongs to.
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.employee_id.clone(), self.leave_type_id.clone())
    }

    /// Appends a line to the notes.
    pub fn append_note(&mut self, note: &str) {
        match &mut self.notes {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(note);
            }
            _ => self.notes = Some(note.to_string()),
        }
    }

    /// Returns true if both records carry the same figures and state.
    ///
    /// Timestamps and notes are ignored.
    pub fn same_figures(&self, other: &LeaveAccrualRecord) -> bool {
        self.days_accrued == other.days_accrued
            && self.days_adjusted == other.days_adjusted
            && self.days_used == other.days_used
            && self.days_balance == other.days_balance
            && self.is_processed == other.is_processed
    }
}
