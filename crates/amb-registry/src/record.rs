//! Registry state, role table, and notifications.

use amb_core::{Address, AssetId, Role};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Per-asset approval state. Absence reads as all-false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Role A has approved.
    pub role_a: bool,
    /// Role B has approved.
    pub role_b: bool,
    /// Role C has approved.
    pub role_c: bool,
    /// All three roles have approved. Monotonic.
    pub aggregated: bool,
}

impl ApprovalRecord {
    /// Flag for `role`.
    pub fn flag(&self, role: Role) -> bool {
        match role {
            Role::RoleA => self.role_a,
            Role::RoleB => self.role_b,
            Role::RoleC => self.role_c,
        }
    }

    pub(crate) fn set(&mut self, role: Role) {
        match role {
            Role::RoleA => self.role_a = true,
            Role::RoleB => self.role_b = true,
            Role::RoleC => self.role_c = true,
        }
    }

    /// Whether every role flag is set.
    pub fn all_approved(&self) -> bool {
        self.role_a && self.role_b && self.role_c
    }

    /// The four booleans in `(role_a, role_b, role_c, aggregated)` order.
    pub fn as_tuple(&self) -> (bool, bool, bool, bool) {
        (self.role_a, self.role_b, self.role_c, self.aggregated)
    }
}

/// Registry notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ApprovalEvent {
    /// One role approved one asset.
    Approved {
        /// Approved asset.
        asset_id: AssetId,
        /// Caller address.
        approver: Address,
        /// Role approved as.
        role: Role,
    },
    /// The third distinct approval landed. Emitted once per asset.
    FullyApproved {
        /// Aggregated asset.
        asset_id: AssetId,
    },
}

impl ApprovalEvent {
    /// Asset the event concerns.
    pub fn asset_id(&self) -> AssetId {
        match self {
            Self::Approved { asset_id, .. } | Self::FullyApproved { asset_id } => *asset_id,
        }
    }
}

/// Immutable mapping from role to the single address allowed to act as it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleTable {
    role_a: Address,
    role_b: Address,
    role_c: Address,
}

impl RoleTable {
    /// Bind the three roles to three distinct addresses.
    pub fn new(role_a: Address, role_b: Address, role_c: Address) -> Result<Self, RegistryError> {
        if role_a == role_b || role_a == role_c || role_b == role_c {
            return Err(RegistryError::InvalidRoleTable(
                "each role must be held by a distinct address".to_string(),
            ));
        }
        if [role_a, role_b, role_c].contains(&Address::ZERO) {
            return Err(RegistryError::InvalidRoleTable(
                "the zero address cannot hold a role".to_string(),
            ));
        }
        Ok(Self { role_a, role_b, role_c })
    }

    /// Address bound to `role`.
    pub fn holder(&self, role: Role) -> Address {
        match role {
            Role::RoleA => self.role_a,
            Role::RoleB => self.role_b,
            Role::RoleC => self.role_c,
        }
    }

    /// Whether `caller` holds `role`.
    pub fn is_holder(&self, role: Role, caller: &Address) -> bool {
        self.holder(role) == *caller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn record_defaults_to_unapproved() {
        let r = ApprovalRecord::default();
        assert_eq!(r.as_tuple(), (false, false, false, false));
        assert!(!r.all_approved());
    }

    #[test]
    fn role_table_rejects_shared_holders() {
        assert!(RoleTable::new(addr(1), addr(1), addr(2)).is_err());
        assert!(RoleTable::new(addr(1), addr(2), addr(2)).is_err());
        assert!(RoleTable::new(Address::ZERO, addr(2), addr(3)).is_err());
    }

    #[test]
    fn role_table_lookup() {
        let t = RoleTable::new(addr(1), addr(2), addr(3)).unwrap();
        assert_eq!(t.holder(Role::RoleB), addr(2));
        assert!(t.is_holder(Role::RoleC, &addr(3)));
        assert!(!t.is_holder(Role::RoleC, &addr(1)));
    }

    #[test]
    fn event_json_shape() {
        let e = ApprovalEvent::FullyApproved { asset_id: AssetId(42) };
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            serde_json::json!({"event": "fully_approved", "asset_id": 42})
        );
        assert_eq!(e.asset_id(), AssetId(42));
    }
}
