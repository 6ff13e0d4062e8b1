//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the leave
//! type catalog and ledger settings from YAML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LeaveTypeRegistry;
use crate::models::{Employee, LeaveType};

use super::types::{EmployeesConfig, LeaveTypesConfig, LedgerSettings, policy_problem};

/// Loads and provides access to ledger configuration.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── leave_types.yaml   # Leave type catalog with accrual policies
/// ├── ledger.yaml        # Lock timeout, upcoming window, log level
/// └── employees.yaml     # Optional employee seed
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard")?;
/// println!("{} leave types", loader.leave_types().len());
/// # Ok::<(), leave_ledger::error::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    leave_types: Vec<LeaveType>,
    settings: LedgerSettings,
    employees: Vec<Employee>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if:
    /// - `leave_types.yaml` or `ledger.yaml` is missing
    /// - Any present file contains invalid YAML
    /// - The catalog is empty, repeats an id, or carries a negative figure
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();

        let leave_types_path = path.join("leave_types.yaml");
        let catalog = Self::load_yaml::<LeaveTypesConfig>(&leave_types_path)?;
        let leave_types = Self::validate_catalog(catalog, &leave_types_path)?;

        let settings_path = path.join("ledger.yaml");
        let settings = Self::load_yaml::<LedgerSettings>(&settings_path)?;

        let employees_path = path.join("employees.yaml");
        let employees = if employees_path.exists() {
            Self::load_yaml::<EmployeesConfig>(&employees_path)?.employees
        } else {
            Vec::new()
        };

        Ok(Self {
            leave_types,
            settings,
            employees,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> LedgerResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate_catalog(catalog: LeaveTypesConfig, path: &Path) -> LedgerResult<Vec<LeaveType>> {
        let parse_error = |message: String| LedgerError::ConfigParseError {
            path: path.display().to_string(),
            message,
        };

        if catalog.leave_types.is_empty() {
            return Err(parse_error("no leave types defined".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &catalog.leave_types {
            if !seen.insert(entry.id.as_str()) {
                return Err(parse_error(format!("duplicate leave type id '{}'", entry.id)));
            }
            if let Some(problem) = policy_problem(&entry.policy) {
                return Err(parse_error(format!("leave type '{}': {}", entry.id, problem)));
            }
        }

        Ok(catalog.leave_types.into_iter().map(LeaveType::from).collect())
    }

    /// Returns the leave type catalog in file order.
    pub fn leave_types(&self) -> &[LeaveType] {
        &self.leave_types
    }

    /// Returns the ledger settings.
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Returns the seeded employees, empty when no seed file exists.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Builds a registry holding the catalog.
    pub fn registry(&self) -> LeaveTypeRegistry {
        LeaveTypeRegistry::new(self.leave_types.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccrualPolicy, LeaveTypeId};
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/standard"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn scratch_dir(name: &str, leave_types: &str, ledger: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "leave-ledger-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leave_types.yaml"), leave_types).unwrap();
        fs::write(dir.join("ledger.yaml"), ledger).unwrap();
        dir
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.leave_types().len(), 5);
        assert_eq!(loader.settings().lock_timeout_ms, 5000);
        assert_eq!(loader.settings().upcoming_window_days, 30);
    }

    #[test]
    fn test_annual_leave_accrues_monthly() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let registry = loader.registry();

        let annual = registry.get(&LeaveTypeId::new("annual")).unwrap();
        assert_eq!(
            annual.policy,
            AccrualPolicy::MonthlyAccrual {
                monthly_rate: dec("2.0"),
                annual_cap: dec("24"),
            }
        );
    }

    #[test]
    fn test_sick_leave_is_flat() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let sick = loader
            .leave_types()
            .iter()
            .find(|t| t.id.as_str() == "sick")
            .unwrap();
        assert_eq!(
            sick.policy,
            AccrualPolicy::Flat {
                max_days: dec("10")
            }
        );
    }

    #[test]
    fn test_standard_employee_seed() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let employees = loader.employees();
        assert_eq!(employees.len(), 3);
        assert!(employees.iter().all(|e| e.hire_date.is_some()));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(LedgerError::ConfigNotFound { path }) => {
                assert!(path.contains("leave_types.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_duplicate_leave_type_rejected() {
        let dir = scratch_dir(
            "duplicate",
            r#"
leave_types:
  - id: sick
    name: Sick
    policy: { kind: flat, max_days: "10" }
  - id: sick
    name: Sick again
    policy: { kind: flat, max_days: "5" }
"#,
            "lock_timeout_ms: 100\n",
        );

        match ConfigLoader::load(&dir) {
            Err(LedgerError::ConfigParseError { message, .. }) => {
                assert!(message.contains("duplicate leave type id 'sick'"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_negative_rate_rejected() {
        let dir = scratch_dir(
            "negative",
            r#"
leave_types:
  - id: annual
    name: Annual
    policy: { kind: monthly_accrual, monthly_rate: "-2", annual_cap: "24" }
"#,
            "lock_timeout_ms: 100\n",
        );

        assert!(matches!(
            ConfigLoader::load(&dir),
            Err(LedgerError::ConfigParseError { .. })
        ));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_settings_default_when_omitted() {
        let dir = scratch_dir(
            "defaults",
            r#"
leave_types:
  - id: casual
    name: Casual
    policy: { kind: flat, max_days: "12" }
"#,
            "{}\n",
        );

        let loader = ConfigLoader::load(&dir).unwrap();
        assert_eq!(loader.settings(), &LedgerSettings::default());
        assert!(loader.employees().is_empty());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_yaml_returns_parse_error() {
        let dir = scratch_dir("malformed", "leave_types: [", "{}\n");
        assert!(matches!(
            ConfigLoader::load(&dir),
            Err(LedgerError::ConfigParseError { .. })
        ));
        fs::remove_dir_all(dir).ok();
    }
}
