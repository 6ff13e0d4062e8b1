//! Leave type catalog entries and their accrual policies.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Days credited each month under the standard annual leave schedule.
pub const STANDARD_MONTHLY_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Ceiling on the accrued balance under the standard annual leave schedule.
pub const STANDARD_ANNUAL_CAP: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// Identifier of a leave type (e.g., "annual", "sick").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveTypeId(pub String);

impl LeaveTypeId {
    /// Wraps an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaveTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeaveTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How a leave type grants entitlement.
///
/// # Example
///
/// ```
/// use leave_ledger::models::AccrualPolicy;
///
/// let policy: AccrualPolicy = serde_json::from_str(
///     r#"{"kind": "monthly_accrual", "monthly_rate": "2.0", "annual_cap": "24"}"#,
/// )
/// .unwrap();
/// assert!(policy.is_accrual_bearing());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccrualPolicy {
    /// A fixed allowance; approved leave is deducted from it.
    Flat {
        /// The allowance in days.
        max_days: Decimal,
    },
    /// Entitlement grows every month and is tracked in the accrual ledger.
    MonthlyAccrual {
        /// Days credited per month.
        monthly_rate: Decimal,
        /// Ceiling the accrued balance never grows past.
        annual_cap: Decimal,
    },
}

impl AccrualPolicy {
    /// The standard annual leave schedule: 2 days a month, capped at 24.
    pub fn standard_annual() -> Self {
        AccrualPolicy::MonthlyAccrual {
            monthly_rate: STANDARD_MONTHLY_RATE,
            annual_cap: STANDARD_ANNUAL_CAP,
        }
    }

    /// Returns true if the policy is tracked in the monthly ledger.
    pub fn is_accrual_bearing(&self) -> bool {
        matches!(self, AccrualPolicy::MonthlyAccrual { .. })
    }

    /// Days credited for one month given the balance carried into it.
    ///
    /// Accrual never lifts the balance above the annual cap. Flat policies
    /// never accrue.
    ///
    /// ```
    /// use leave_ledger::models::AccrualPolicy;
    /// use rust_decimal::Decimal;
    ///
    /// let policy = AccrualPolicy::standard_annual();
    /// assert_eq!(policy.monthly_accrual(Decimal::from(10)), Decimal::from(2));
    /// assert_eq!(policy.monthly_accrual(Decimal::from(23)), Decimal::from(1));
    /// assert_eq!(policy.monthly_accrual(Decimal::from(30)), Decimal::ZERO);
    /// ```
    pub fn monthly_accrual(&self, carried_balance: Decimal) -> Decimal {
        match self {
            AccrualPolicy::Flat { .. } => Decimal::ZERO,
            AccrualPolicy::MonthlyAccrual {
                monthly_rate,
                annual_cap,
            } => {
                let headroom = (*annual_cap - carried_balance).max(Decimal::ZERO);
                (*monthly_rate).min(headroom)
            }
        }
    }
}

/// A leave category in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    /// Unique identifier.
    pub id: LeaveTypeId,
    /// Human-readable name (e.g., "Annual").
    pub name: String,
    /// How entitlement is granted.
    pub policy: AccrualPolicy,
}

impl LeaveType {
    /// Returns true if the type is tracked in the monthly ledger.
    pub fn is_accrual_bearing(&self) -> bool {
        self.policy.is_accrual_bearing()
    }
}
