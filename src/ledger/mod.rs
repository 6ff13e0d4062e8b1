//! The leave entitlement ledger.
//!
//! This module contains the accrual engine, balance calculation, overlap
//! detection, audit recording and the [`LeaveLedger`] facade that ties them
//! to pluggable stores.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use leave_ledger::config::ConfigLoader;
//! use leave_ledger::ledger::{
//!     InMemoryEmployeeDirectory, LeaveLedger, LedgerStores, SystemClock,
//! };
//! use leave_ledger::models::{EmployeeId, LeaveTypeId};
//!
//! let config = ConfigLoader::load("./config/standard")?;
//! let ledger = LeaveLedger::new(
//!     config.registry(),
//!     LedgerStores::in_memory(InMemoryEmployeeDirectory::new()),
//!     Arc::new(SystemClock),
//!     config.settings().clone(),
//! );
//! let balance = ledger.get_balance(&EmployeeId::new("emp_001"), &LeaveTypeId::new("annual"))?;
//! println!("{} days available", balance.balance);
//! # Ok::<(), leave_ledger::error::LedgerError>(())
//! ```

mod accrual;
mod audit;
mod balance;
mod clock;
mod locks;
mod memory;
mod overlap;
mod registry;
mod service;
mod store;

pub use accrual::{AccrualProcessor, LedgerScope};
pub use audit::{AuditEntry, AuditRecorder, snapshot};
pub use balance::BalanceCalculator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use locks::{KeyGuard, KeyedLocks};
pub use memory::{
    InMemoryAccrualStore, InMemoryAuditLog, InMemoryEmployeeDirectory, InMemoryLeaveRequestStore,
};
pub use overlap::OverlapValidator;
pub use registry::LeaveTypeRegistry;
pub use service::{LeaveLedger, LedgerStores};
pub use store::{
    AccrualStore, AuditFilter, AuditSink, EmployeeDirectory, LeaveRequestStore, RequestFilter,
    StoreError,
};
