//! Employee model.
//!
//! The ledger does not manage employee profiles. It only needs an identity
//! and the dates that decide when monthly accrual begins.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of an employee in the profile directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    /// Wraps an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Represents an employee whose leave is tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: EmployeeId,
    /// Display name, used in logs only.
    pub name: String,
    /// The contractual hire date, when recorded.
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    /// The date the employee actually started, when recorded.
    #[serde(default)]
    pub employment_start_date: Option<NaiveDate>,
    /// The date the employee's account was created.
    pub created_on: NaiveDate,
}

impl Employee {
    /// Returns the date monthly accrual is counted from.
    ///
    /// The hire date wins over the employment start date, which wins over the
    /// account creation date.
    ///
    /// # Examples
    ///
    /// ```
    /// use leave_ledger::models::{Employee, EmployeeId};
    /// use chrono::NaiveDate;
    ///
    /// let employee = Employee {
    ///     id: EmployeeId::new("emp_001"),
    ///     name: "Alex Doe".to_string(),
    ///     hire_date: None,
    ///     employment_start_date: NaiveDate::from_ymd_opt(2024, 3, 4),
    ///     created_on: NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(),
    /// };
    /// assert_eq!(
    ///     employee.accrual_start_date(),
    ///     NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    /// );
    /// ```
    pub fn accrual_start_date(&self) -> NaiveDate {
        self.hire_date
            .or(self.employment_start_date)
            .unwrap_or(self.created_on)
    }
}
