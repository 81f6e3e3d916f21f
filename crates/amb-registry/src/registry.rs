//! # ApprovalRegistry
//!
//! State lives in a [`LedgerStore`] keyed by asset id; every approval is a
//! single per-key transaction that validates the caller and the flag,
//! mutates the record, and emits its notifications while the key is held.
//! Notifications for one asset are therefore always in commit order, and
//! `FullyApproved` is emitted by exactly the transaction that flipped
//! `aggregated`.

use std::sync::Arc;

use amb_core::{Address, AssetId, Role};
use amb_ledger::{BlockClock, EventLog, LedgerEvent, LedgerStore, SignedCall, TxReceipt};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::record::{ApprovalEvent, ApprovalRecord, RoleTable};

/// Domain tag for signed approval calls.
pub const APPROVE_DOMAIN: &str = "amb.registry.approve.v1";

/// Arguments of a signed approval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveCall {
    /// Role the caller approves as.
    pub role: Role,
    /// Asset being approved.
    pub asset_id: AssetId,
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    /// Inclusion receipt.
    pub receipt: TxReceipt,
    /// State after the call.
    pub state: ApprovalRecord,
    /// Whether this call completed aggregation.
    pub fully_approved: bool,
}

/// The approval registry on the permissioned ledger.
#[derive(Debug, Clone)]
pub struct ApprovalRegistry {
    roles: RoleTable,
    records: LedgerStore<AssetId, ApprovalRecord>,
    events: EventLog<ApprovalEvent>,
    clock: Arc<BlockClock>,
}

impl ApprovalRegistry {
    /// Deploy a registry with a fixed role table.
    pub fn new(roles: RoleTable) -> Self {
        Self::with_clock(roles, Arc::new(BlockClock::new()))
    }

    /// Deploy onto a ledger whose block clock is shared with other
    /// components.
    pub fn with_clock(roles: RoleTable, clock: Arc<BlockClock>) -> Self {
        tracing::info!(
            role_a = %roles.holder(Role::RoleA),
            role_b = %roles.holder(Role::RoleB),
            role_c = %roles.holder(Role::RoleC),
            "approval registry deployed"
        );
        Self {
            roles,
            records: LedgerStore::new(),
            events: EventLog::new(),
            clock,
        }
    }

    /// Approve `asset_id` as `role` on behalf of an already-authenticated
    /// `caller`.
    pub fn approve_as(
        &self,
        role: Role,
        asset_id: AssetId,
        caller: Address,
    ) -> Result<ApprovalOutcome, RegistryError> {
        if !self.roles.is_holder(role, &caller) {
            tracing::warn!(%asset_id, %role, %caller, "unauthorized approval rejected");
            return Err(RegistryError::NotAuthorized {
                asset_id,
                role,
                caller,
            });
        }

        let outcome = self.records.transact(asset_id, |record| {
            if record.flag(role) {
                return Err(RegistryError::AlreadyApproved { asset_id, role });
            }
            record.set(role);
            let fully_approved = !record.aggregated && record.all_approved();
            if fully_approved {
                record.aggregated = true;
            }

            let receipt = self.clock.include();
            self.events.emit(
                receipt.block_height,
                ApprovalEvent::Approved {
                    asset_id,
                    approver: caller,
                    role,
                },
            );
            if fully_approved {
                self.events
                    .emit(receipt.block_height, ApprovalEvent::FullyApproved { asset_id });
            }
            Ok(ApprovalOutcome {
                receipt,
                state: *record,
                fully_approved,
            })
        });

        match &outcome {
            Ok(o) => {
                metrics::counter!("amb_registry_approvals_total", "role" => role.as_str()).increment(1);
                tracing::info!(%asset_id, %role, block = o.receipt.block_height, "approval recorded");
                if o.fully_approved {
                    metrics::counter!("amb_registry_fully_approved_total").increment(1);
                    tracing::info!(%asset_id, "asset fully approved");
                }
            }
            Err(e) => tracing::debug!(%asset_id, %role, error = %e, "approval rejected"),
        }
        outcome
    }

    /// Approve as role A.
    pub fn approve_as_role_a(&self, asset_id: AssetId, caller: Address) -> Result<ApprovalOutcome, RegistryError> {
        self.approve_as(Role::RoleA, asset_id, caller)
    }

    /// Approve as role B.
    pub fn approve_as_role_b(&self, asset_id: AssetId, caller: Address) -> Result<ApprovalOutcome, RegistryError> {
        self.approve_as(Role::RoleB, asset_id, caller)
    }

    /// Approve as role C.
    pub fn approve_as_role_c(&self, asset_id: AssetId, caller: Address) -> Result<ApprovalOutcome, RegistryError> {
        self.approve_as(Role::RoleC, asset_id, caller)
    }

    /// Approve via a signed call; the caller is the signer's address.
    pub fn approve_signed(&self, call: &SignedCall<ApproveCall>) -> Result<ApprovalOutcome, RegistryError> {
        let caller = call
            .verify(APPROVE_DOMAIN)
            .map_err(|e| RegistryError::Unauthenticated(e.to_string()))?;
        self.approve_as(call.payload.role, call.payload.asset_id, caller)
    }

    /// Current state of `asset_id`. Pure read.
    pub fn get_approval_state(&self, asset_id: AssetId) -> ApprovalRecord {
        self.records.read(&asset_id)
    }

    /// Every asset with `aggregated == true`, ascending.
    pub fn aggregated_assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self
            .records
            .select(|_, record| record.aggregated)
            .into_iter()
            .map(|(asset_id, _)| asset_id)
            .collect();
        assets.sort_unstable();
        assets
    }

    /// Up to `limit` notifications after `cursor`.
    pub fn events_since(&self, cursor: u64, limit: usize) -> Vec<LedgerEvent<ApprovalEvent>> {
        self.events.events_since(cursor, limit)
    }

    /// Sequence number of the newest notification.
    pub fn event_head(&self) -> u64 {
        self.events.head()
    }

    /// Wait until a notification after `cursor` exists.
    pub async fn wait_for_events(&self, cursor: u64) {
        self.events.wait_beyond(cursor).await;
    }

    /// Address bound to `role`.
    pub fn role_holder(&self, role: Role) -> Address {
        self.roles.holder(role)
    }

    /// Current block height of the permissioned ledger.
    pub fn block_height(&self) -> u64 {
        self.clock.height()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn test_registry() -> ApprovalRegistry {
        let roles = RoleTable::new(
            Address::from_bytes([1; 20]),
            Address::from_bytes([2; 20]),
            Address::from_bytes([3; 20]),
        )
        .unwrap();
        ApprovalRegistry::new(roles)
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::RoleA), Just(Role::RoleB), Just(Role::RoleC)]
    }

    proptest! {
        #[test]
        fn aggregation_is_monotonic_and_fires_once(
            calls in prop::collection::vec((role_strategy(), 0u64..4, any::<bool>()), 0..40)
        ) {
            let reg = test_registry();
            let mut was_aggregated = [false; 4];
            for (role, asset, authorized) in calls {
                let caller = if authorized {
                    reg.role_holder(role)
                } else {
                    Address::from_bytes([9; 20])
                };
                let _ = reg.approve_as(role, AssetId(asset), caller);
                for (i, was) in was_aggregated.iter_mut().enumerate() {
                    let state = reg.get_approval_state(AssetId(i as u64));
                    prop_assert!(!(*was && !state.aggregated));
                    prop_assert_eq!(state.aggregated, state.all_approved());
                    *was = state.aggregated;
                }
            }
            for i in 0..4u64 {
                let fired = reg
                    .events_since(0, usize::MAX)
                    .into_iter()
                    .filter(|e| e.payload == ApprovalEvent::FullyApproved { asset_id: AssetId(i) })
                    .count();
                prop_assert_eq!(fired, usize::from(was_aggregated[i as usize]));
            }
        }
    }
}
