//! Configuration loading and management for the leave ledger.
//!
//! This module loads the leave type catalog, the ledger's operational
//! settings and an optional employee seed from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use leave_ledger::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Lock timeout: {}ms", config.settings().lock_timeout_ms);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EmployeesConfig, LeaveTypeEntry, LeaveTypesConfig, LedgerSettings};
