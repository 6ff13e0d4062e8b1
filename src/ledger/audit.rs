//! Best-effort audit recording.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::models::{AuditAction, AuditEntityType, AuditEvent, EmployeeId};

use super::clock::Clock;
use super::store::{AuditFilter, AuditSink};

/// Snapshots a value for an audit event. Unserializable values are dropped.
pub fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// What an audit event is about and who caused it.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// The kind of entity.
    pub entity_type: AuditEntityType,
    /// The entity's identifier.
    pub entity_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub performed_by: EmployeeId,
    /// State before.
    pub old_value: Option<serde_json::Value>,
    /// State after.
    pub new_value: Option<serde_json::Value>,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl AuditEntry {
    /// Starts an entry with no snapshots or comment.
    pub fn new(
        entity_type: AuditEntityType,
        entity_id: impl Into<String>,
        action: AuditAction,
        performed_by: &EmployeeId,
    ) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
            action,
            performed_by: performed_by.clone(),
            old_value: None,
            new_value: None,
            comment: None,
        }
    }

    /// Attaches the state before the change.
    pub fn old_value<T: Serialize>(mut self, value: &T) -> Self {
        self.old_value = snapshot(value);
        self
    }

    /// Attaches the state after the change.
    pub fn new_value<T: Serialize>(mut self, value: &T) -> Self {
        self.new_value = snapshot(value);
        self
    }

    /// Attaches a comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Appends audit events without ever failing the caller.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl AuditRecorder {
    /// Creates a recorder writing to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Records `entry`. Sink failures are logged and swallowed.
    pub fn record(&self, entry: AuditEntry) {
        let event = AuditEvent {
            id: Uuid::new_v4(),
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            action: entry.action,
            performed_by: entry.performed_by,
            timestamp: self.clock.now(),
            old_value: entry.old_value,
            new_value: entry.new_value,
            comment: entry.comment,
        };

        let (entity_id, action) = (event.entity_id.clone(), event.action);
        if let Err(error) = self.sink.append(event) {
            warn!(
                entity_id = %entity_id,
                action = ?action,
                error = %error,
                "Failed to record audit event"
            );
        }
    }

    /// Returns matching events in chronological order.
    pub fn events(&self, filter: &AuditFilter) -> LedgerResult<Vec<AuditEvent>> {
        Ok(self.sink.query(filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::clock::SystemClock;
    use crate::ledger::memory::InMemoryAuditLog;
    use crate::ledger::store::StoreError;

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn append(&self, _event: AuditEvent) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("audit database offline".to_string()))
        }

        fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditEvent>, StoreError> {
            Err(StoreError::Unavailable("audit database offline".to_string()))
        }
    }

    #[test]
    fn test_record_appends_event_with_snapshots() {
        let log = Arc::new(InMemoryAuditLog::new());
        let recorder = AuditRecorder::new(log.clone(), Arc::new(SystemClock));

        recorder.record(
            AuditEntry::new(
                AuditEntityType::LeaveRequest,
                "req-1",
                AuditAction::Reject,
                &EmployeeId::new("mgr_001"),
            )
            .old_value(&"pending")
            .new_value(&"rejected")
            .comment("Team at capacity"),
        );

        let events = recorder.events(&AuditFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::Reject);
        assert_eq!(events[0].old_value, Some(serde_json::json!("pending")));
        assert_eq!(events[0].comment.as_deref(), Some("Team at capacity"));
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let recorder = AuditRecorder::new(Arc::new(BrokenSink), Arc::new(SystemClock));
        recorder.record(AuditEntry::new(
            AuditEntityType::LeaveRequest,
            "req-1",
            AuditAction::Create,
            &EmployeeId::new("emp_001"),
        ));
        assert!(recorder.events(&AuditFilter::default()).is_err());
    }

    #[test]
    fn test_events_filter_by_actor() {
        let log = Arc::new(InMemoryAuditLog::new());
        let recorder = AuditRecorder::new(log, Arc::new(SystemClock));
        for actor in ["emp_001", "mgr_001", "emp_001"] {
            recorder.record(AuditEntry::new(
                AuditEntityType::LeaveRequest,
                "req-1",
                AuditAction::Update,
                &EmployeeId::new(actor),
            ));
        }

        let filter = AuditFilter {
            performed_by: Some(EmployeeId::new("emp_001")),
            ..AuditFilter::default()
        };
        assert_eq!(recorder.events(&filter).unwrap().len(), 2);
    }
}
