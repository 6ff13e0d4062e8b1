//! Overlap detection between leave requests.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::LedgerResult;
use crate::models::{EmployeeId, LeaveRequestId, LeaveStatus};

use super::store::{LeaveRequestStore, RequestFilter};

/// Checks whether an employee already has active leave over a date range.
///
/// Active means Pending or Approved, across every leave type. Store failures
/// propagate as errors and are never read as "no overlap".
#[derive(Clone)]
pub struct OverlapValidator {
    requests: Arc<dyn LeaveRequestStore>,
}

impl OverlapValidator {
    /// Creates a validator reading from `requests`.
    pub fn new(requests: Arc<dyn LeaveRequestStore>) -> Self {
        Self { requests }
    }

    /// Returns true if any active request intersects `start..=end`.
    ///
    /// The request named by `exclude`, if any, is ignored.
    pub fn has_overlap(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<LeaveRequestId>,
    ) -> LedgerResult<bool> {
        let filter = RequestFilter::all()
            .for_employee(employee_id)
            .with_statuses(&[LeaveStatus::Pending, LeaveStatus::Approved]);

        let conflict = self
            .requests
            .list(&filter)?
            .into_iter()
            .filter(|request| Some(request.id) != exclude)
            .find(|request| request.overlaps(start, end));

        if let Some(existing) = &conflict {
            debug!(
                employee_id = %employee_id,
                conflicting_request = %existing.id,
                "Overlapping leave found"
            );
        }

        Ok(conflict.is_some())
    }
}
