//! # Relayer Crash and Restart
//!
//! The relayer's state file is advisory. Restarting from it, from a stale
//! copy, or from nothing at all must neither lose an approved asset nor
//! mint one twice.

use std::path::Path;
use std::sync::Arc;

use amb_core::{Address, AssetId, Role};
use amb_mint::MintGate;
use amb_registry::{ApprovalRegistry, RegistryAttestor, RoleTable};
use amb_relayer::{
    FailureReason, LocalMintTarget, LocalRegistryFeed, PersistedState, RelayPhase, RelayRecord,
    RelayerConfig, RelayerService, RelayerView, ShutdownSignal, StateFile,
};
use amb_zkp::{MockProofSystem, ProofService, PublicInputs, WitnessBundle};

type Relayer = RelayerService<LocalRegistryFeed, LocalMintTarget>;

struct Ledgers {
    registry: Arc<ApprovalRegistry>,
    prover: Arc<MockProofSystem>,
    gate: Arc<MintGate>,
}

fn recipient() -> Address {
    Address::from_bytes([0x5e; 20])
}

fn ledgers() -> Ledgers {
    let roles = RoleTable::new(
        Address::from_bytes([0x0a; 20]),
        Address::from_bytes([0x0b; 20]),
        Address::from_bytes([0x0c; 20]),
    )
    .unwrap();
    let registry = Arc::new(ApprovalRegistry::new(roles));
    let prover = Arc::new(MockProofSystem::default());
    let gate = Arc::new(MintGate::new(Arc::new(prover.verifier())));
    Ledgers {
        registry,
        prover,
        gate,
    }
}

impl Ledgers {
    fn approve_all(&self, asset: u64) {
        for role in Role::ALL {
            self.registry
                .approve_as(role, AssetId(asset), self.registry.role_holder(role))
                .unwrap();
        }
    }

    fn relayer(&self, state: &Path) -> Relayer {
        let config = RelayerConfig {
            recipient: recipient(),
            poll_interval_ms: 5,
            confirmation_timeout_ms: 200,
            state_path: Some(state.to_path_buf()),
            ..RelayerConfig::default()
        };
        RelayerService::new(
            config,
            LocalRegistryFeed::new(self.registry.clone()),
            LocalMintTarget::new(self.gate.clone()),
            self.prover.clone(),
            Arc::new(RegistryAttestor::new(self.registry.clone())),
            ShutdownSignal::never(),
        )
        .unwrap()
    }

    async fn drain(&self, relayer: &Relayer) -> usize {
        let pending = relayer.recover().await.unwrap();
        let n = pending.len();
        for asset in pending {
            relayer.process_asset(asset).await.unwrap();
        }
        n
    }
}

#[tokio::test]
async fn restart_after_clean_run_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");
    let l = ledgers();
    l.approve_all(42);

    let first = l.relayer(&state);
    assert_eq!(l.drain(&first).await, 1);
    drop(first);

    let persisted = StateFile::new(&state).load().unwrap();
    assert_eq!(persisted.assets[&AssetId(42)].phase, RelayPhase::Confirmed);

    let second = l.relayer(&state);
    assert_eq!(second.status(AssetId(42)).unwrap().phase, RelayPhase::Confirmed);
    assert_eq!(l.drain(&second).await, 0);
    assert_eq!(l.gate.total_minted(), 1);
    assert_eq!(second.stats().proofs_generated, 0);
}

#[tokio::test]
async fn approvals_during_downtime_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");
    let l = ledgers();
    l.approve_all(1);
    l.drain(&l.relayer(&state)).await;

    // Relayer is down while 2 and 3 are approved.
    l.approve_all(2);
    l.approve_all(3);

    let restarted = l.relayer(&state);
    assert_eq!(l.drain(&restarted).await, 2);
    for asset in 1..=3 {
        assert_eq!(l.gate.balance_of(recipient(), AssetId(asset)), 1);
    }
    assert_eq!(l.gate.total_minted(), 3);
}

#[tokio::test]
async fn mint_landed_but_state_lost() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");
    let l = ledgers();
    l.approve_all(42);

    // The submission landed, then the relayer died before persisting.
    let proof = l
        .prover
        .prove(&WitnessBundle::from_flags(AssetId(42), true, true, true))
        .unwrap();
    l.gate
        .mint_with_proof(AssetId(42), &proof, &PublicInputs::for_asset(AssetId(42)), recipient())
        .unwrap();

    let restarted = l.relayer(&state);
    assert_eq!(l.drain(&restarted).await, 0);
    assert_eq!(restarted.status(AssetId(42)).unwrap().phase, RelayPhase::Confirmed);
    assert_eq!(restarted.stats().proofs_generated, 0);
    assert_eq!(l.gate.total_minted(), 1);
}

#[tokio::test]
async fn in_flight_and_failed_records_are_not_trusted() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");
    let l = ledgers();
    l.approve_all(7);
    l.approve_all(8);

    // A snapshot from a relayer that crashed mid-saga.
    let mut proving = RelayRecord::new(AssetId(7));
    proving.phase = RelayPhase::Proving;
    let mut failed = RelayRecord::new(AssetId(8));
    failed.phase = RelayPhase::Failed {
        reason: FailureReason::MintNotObserved,
    };
    let mut snapshot = PersistedState {
        registry_cursor: l.registry.event_head(),
        ..PersistedState::default()
    };
    snapshot.assets.insert(AssetId(7), proving);
    snapshot.assets.insert(AssetId(8), failed);
    StateFile::new(&state).save(&snapshot).unwrap();

    let restarted = l.relayer(&state);
    assert!(restarted.status(AssetId(7)).is_none());
    assert!(restarted.status(AssetId(8)).is_none());
    assert_eq!(l.drain(&restarted).await, 2);
    assert_eq!(l.gate.total_minted(), 2);
}

#[tokio::test]
async fn corrupt_state_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");
    std::fs::write(&state, "{ not json").unwrap();
    let l = ledgers();
    l.approve_all(42);

    let relayer = l.relayer(&state);
    assert_eq!(relayer.stats().tracked, 0);
    assert_eq!(relayer.cursor(), 0);
    assert_eq!(l.drain(&relayer).await, 1);
    assert_eq!(l.gate.balance_of(recipient(), AssetId(42)), 1);
    // The next save replaces the torn file.
    assert!(StateFile::new(&state).load().is_ok());
}

#[tokio::test]
async fn restored_confirmation_is_checked_against_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("relayer-state.json");

    let first_run = ledgers();
    first_run.approve_all(7);
    first_run.approve_all(42);
    let first = first_run.relayer(&state);
    assert_eq!(first_run.drain(&first).await, 2);
    drop(first);

    // Both ledgers were redeployed; only 42 has been approved again.
    let second_run = ledgers();
    second_run.approve_all(42);
    let second = second_run.relayer(&state);
    assert_eq!(second.status(AssetId(42)).unwrap().phase, RelayPhase::Confirmed);

    assert_eq!(second_run.drain(&second).await, 1);
    assert!(second_run.gate.is_minted(AssetId(42)));
    assert_eq!(second_run.gate.balance_of(recipient(), AssetId(42)), 1);
    assert!(second.status(AssetId(7)).is_none());
    assert_eq!(second.cursor(), 0);

    let persisted = StateFile::new(&state).load().unwrap();
    assert_eq!(persisted.assets.keys().copied().collect::<Vec<_>>(), vec![AssetId(42)]);
}
