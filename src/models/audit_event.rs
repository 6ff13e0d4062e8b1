//! Append-only audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmployeeId;

/// The kind of entity an audit event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntityType {
    /// A leave request.
    LeaveRequest,
    /// A monthly accrual record.
    LeaveAccrual,
    /// A batch accrual run.
    AccrualBatch,
    /// A leave type in the registry.
    LeaveType,
}

/// The action an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Something was created.
    Create,
    /// A request was approved.
    Approve,
    /// A request was rejected.
    Reject,
    /// A request was cancelled.
    Cancel,
    /// Something was changed.
    Update,
}

/// An immutable record of a state-changing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// What kind of entity changed.
    pub entity_type: AuditEntityType,
    /// Identifier of the entity that changed.
    pub entity_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub performed_by: EmployeeId,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Snapshot before the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<serde_json::Value>,
    /// Snapshot after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<serde_json::Value>,
    /// Free-text comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
