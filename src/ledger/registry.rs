//! Leave type registry.

use std::collections::BTreeMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccrualPolicy, LeaveType, LeaveTypeId};

/// Catalog of leave categories, keyed by id.
#[derive(Debug, Default)]
pub struct LeaveTypeRegistry {
    types: RwLock<BTreeMap<LeaveTypeId, LeaveType>>,
}

impl LeaveTypeRegistry {
    /// Creates a registry holding `types`. Later duplicates replace earlier ones.
    pub fn new(types: impl IntoIterator<Item = LeaveType>) -> Self {
        let types = types
            .into_iter()
            .map(|leave_type| (leave_type.id.clone(), leave_type))
            .collect();
        Self {
            types: RwLock::new(types),
        }
    }

    /// Looks up a leave type.
    pub fn get(&self, id: &LeaveTypeId) -> LedgerResult<LeaveType> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownLeaveType {
                leave_type_id: id.to_string(),
            })
    }

    /// Every leave type, ordered by id.
    pub fn all(&self) -> Vec<LeaveType> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.values().cloned().collect()
    }

    /// The leave types tracked in the monthly ledger.
    pub fn accrual_bearing(&self) -> Vec<LeaveType> {
        self.all()
            .into_iter()
            .filter(LeaveType::is_accrual_bearing)
            .collect()
    }

    /// Renames a leave type or changes its flat allowance.
    ///
    /// The policy kind never changes. Setting `max_days` on an accrual-bearing
    /// type is rejected.
    pub fn update_leave_type(
        &self,
        id: &LeaveTypeId,
        name: Option<String>,
        max_days: Option<Decimal>,
    ) -> LedgerResult<LeaveType> {
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        let leave_type = types
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownLeaveType {
                leave_type_id: id.to_string(),
            })?;

        let mut updated = leave_type.clone();
        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(LedgerError::InvalidInput {
                    field: "name".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            updated.name = name.to_string();
        }

        if let Some(days) = max_days {
            match &mut updated.policy {
                AccrualPolicy::Flat { max_days } => {
                    if days.is_sign_negative() {
                        return Err(LedgerError::InvalidInput {
                            field: "max_days".to_string(),
                            message: format!("must not be negative, got {days}"),
                        });
                    }
                    *max_days = days;
                }
                AccrualPolicy::MonthlyAccrual { .. } => {
                    return Err(LedgerError::InvalidInput {
                        field: "max_days".to_string(),
                        message: format!("leave type '{id}' accrues monthly and has no flat allowance"),
                    });
                }
            }
        }

        *leave_type = updated.clone();
        info!(leave_type_id = %id, name = %updated.name, "Leave type updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_registry() -> LeaveTypeRegistry {
        LeaveTypeRegistry::new(vec![
            LeaveType {
                id: LeaveTypeId::new("annual"),
                name: "Annual".to_string(),
                policy: AccrualPolicy::standard_annual(),
            },
            LeaveType {
                id: LeaveTypeId::new("sick"),
                name: "Sick".to_string(),
                policy: AccrualPolicy::Flat {
                    max_days: Decimal::from(10),
                },
            },
        ])
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let registry = create_test_registry();
        let result = registry.get(&LeaveTypeId::new("sabbatical"));
        assert!(matches!(
            result,
            Err(LedgerError::UnknownLeaveType { leave_type_id }) if leave_type_id == "sabbatical"
        ));
    }

    #[test]
    fn test_accrual_bearing_filters_flat_types() {
        let registry = create_test_registry();
        let ids: Vec<LeaveTypeId> = registry
            .accrual_bearing()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![LeaveTypeId::new("annual")]);
    }

    #[test]
    fn test_update_flat_allowance_and_name() {
        let registry = create_test_registry();
        let updated = registry
            .update_leave_type(
                &LeaveTypeId::new("sick"),
                Some("Sick & Carer's".to_string()),
                Some(Decimal::from(12)),
            )
            .unwrap();
        assert_eq!(updated.name, "Sick & Carer's");
        assert_eq!(
            registry.get(&LeaveTypeId::new("sick")).unwrap().policy,
            AccrualPolicy::Flat {
                max_days: Decimal::from(12)
            }
        );
    }

    #[test]
    fn test_update_cannot_give_accrual_type_an_allowance() {
        let registry = create_test_registry();
        let result =
            registry.update_leave_type(&LeaveTypeId::new("annual"), None, Some(Decimal::from(20)));
        assert!(matches!(result, Err(LedgerError::InvalidInput { .. })));
        assert!(registry.get(&LeaveTypeId::new("annual")).unwrap().is_accrual_bearing());
    }

    #[test]
    fn test_update_rejects_negative_allowance() {
        let registry = create_test_registry();
        let result =
            registry.update_leave_type(&LeaveTypeId::new("sick"), None, Some(Decimal::from(-1)));
        assert!(matches!(result, Err(LedgerError::InvalidInput { .. })));
    }
}
