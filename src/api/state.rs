//! Application state for the leave ledger API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::ledger::LeaveLedger;

/// Shared application state.
///
/// Holds the ledger behind an `Arc` so handlers can move it onto the
/// blocking thread pool.
#[derive(Clone)]
pub struct AppState {
    /// The leave ledger.
    ledger: Arc<LeaveLedger>,
}

impl AppState {
    /// Creates a new application state around the given ledger.
    pub fn new(ledger: LeaveLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }

    /// Returns a reference to the ledger.
    pub fn ledger(&self) -> &LeaveLedger {
        &self.ledger
    }

    /// Returns a shared handle to the ledger.
    pub fn shared_ledger(&self) -> Arc<LeaveLedger> {
        Arc::clone(&self.ledger)
    }
}
