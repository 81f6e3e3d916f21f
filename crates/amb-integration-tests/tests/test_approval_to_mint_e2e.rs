//! # End-to-End: Approval to Mint
//!
//! Asset 42 walks the full bridge: three role holders sign approvals on
//! the permissioned ledger, the registry aggregates them, the relayer
//! proves and submits, and the mint gate credits the recipient exactly
//! once. Everything runs in-process against real components.

use std::sync::Arc;

use amb_core::{Address, AssetId, Role};
use amb_ledger::{Ed25519KeyPair, SignedCall};
use amb_mint::{MintError, MintEvent, MintGate};
use amb_registry::{
    ApprovalEvent, ApprovalRegistry, ApproveCall, RegistryAttestor, RegistryError, RoleTable,
    APPROVE_DOMAIN,
};
use amb_relayer::{
    LocalMintTarget, LocalRegistryFeed, RelayPhase, RelayerConfig, RelayerService, RelayerView,
    ShutdownSignal,
};
use amb_zkp::{
    AttestationError, MockProofSystem, ProofService, PublicInputs, WitnessBundle, WitnessSource,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Bridge {
    keys: Vec<(Role, Ed25519KeyPair)>,
    registry: Arc<ApprovalRegistry>,
    prover: Arc<MockProofSystem>,
    gate: Arc<MintGate>,
}

fn recipient() -> Address {
    Address::from_bytes([0x5e; 20])
}

fn bridge() -> Bridge {
    let keys: Vec<(Role, Ed25519KeyPair)> = Role::ALL
        .into_iter()
        .enumerate()
        .map(|(i, role)| (role, Ed25519KeyPair::from_seed(&[i as u8 + 1; 32])))
        .collect();
    let roles = RoleTable::new(keys[0].1.address(), keys[1].1.address(), keys[2].1.address()).unwrap();
    let registry = Arc::new(ApprovalRegistry::new(roles));
    let prover = Arc::new(MockProofSystem::default());
    let gate = Arc::new(MintGate::new(Arc::new(prover.verifier())));
    Bridge {
        keys,
        registry,
        prover,
        gate,
    }
}

impl Bridge {
    fn approve(&self, role: Role, asset: u64) -> Result<bool, RegistryError> {
        let key = &self.keys.iter().find(|(r, _)| *r == role).unwrap().1;
        let call = SignedCall::sign(
            APPROVE_DOMAIN,
            ApproveCall {
                role,
                asset_id: AssetId(asset),
            },
            key,
        )
        .unwrap();
        self.registry.approve_signed(&call).map(|o| o.fully_approved)
    }

    fn relayer(&self) -> RelayerService<LocalRegistryFeed, LocalMintTarget> {
        let config = RelayerConfig {
            recipient: recipient(),
            poll_interval_ms: 5,
            confirmation_timeout_ms: 200,
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
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn asset_42_approved_by_three_roles_mints_once() {
    let b = bridge();

    // Act 1: approvals accumulate; aggregation fires on the third.
    assert!(!b.approve(Role::RoleA, 42).unwrap());
    assert_eq!(b.registry.get_approval_state(AssetId(42)).as_tuple(), (true, false, false, false));
    assert!(!b.approve(Role::RoleB, 42).unwrap());
    assert!(b.approve(Role::RoleC, 42).unwrap());
    assert_eq!(b.registry.get_approval_state(AssetId(42)).as_tuple(), (true, true, true, true));

    let events = b.registry.events_since(0, 100);
    let fully: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.payload, ApprovalEvent::FullyApproved { .. }))
        .collect();
    assert_eq!(fully.len(), 1);
    assert_eq!(fully[0].payload.asset_id(), AssetId(42));
    assert_eq!(events.len(), 4);

    // Act 2: the relayer notices, proves, and mints.
    let relayer = b.relayer();
    let pending = relayer.recover().await.unwrap();
    assert_eq!(pending, vec![AssetId(42)]);
    assert_eq!(relayer.process_asset(AssetId(42)).await.unwrap(), RelayPhase::Confirmed);

    assert!(b.gate.is_minted(AssetId(42)));
    assert_eq!(b.gate.owner_of(AssetId(42)), Some(recipient()));
    assert_eq!(b.gate.balance_of(recipient(), AssetId(42)), 1);
    assert_eq!(b.gate.total_minted(), 1);

    let minted = b.gate.events_since(0, 10);
    assert_eq!(minted.len(), 1);
    let MintEvent::Minted {
        asset_id,
        recipient: to,
        ..
    } = &minted[0].payload;
    assert_eq!((*asset_id, *to), (AssetId(42), recipient()));

    let status = relayer.status(AssetId(42)).unwrap();
    assert_eq!(status.phase, RelayPhase::Confirmed);
    assert_eq!(status.proving_attempts, 1);
    assert_eq!(status.submission_attempts, 1);
    assert!(status.mint_block.is_some());

    // Act 3: a second submission of a fresh valid proof is refused.
    let witness = WitnessBundle::from_flags(AssetId(42), true, true, true);
    let proof = b.prover.prove(&witness).unwrap();
    let err = b
        .gate
        .mint_with_proof(AssetId(42), &proof, &PublicInputs::for_asset(AssetId(42)), recipient())
        .unwrap_err();
    assert_eq!(err, MintError::AlreadyMinted(AssetId(42)));
    assert_eq!(b.gate.balance_of(recipient(), AssetId(42)), 1);
}

#[tokio::test]
async fn partial_approvals_never_reach_the_mint_gate() {
    let b = bridge();
    b.approve(Role::RoleA, 7).unwrap();
    b.approve(Role::RoleC, 7).unwrap();

    let relayer = b.relayer();
    assert!(relayer.recover().await.unwrap().is_empty());
    assert!(relayer.status(AssetId(7)).is_none());
    assert!(!b.gate.is_minted(AssetId(7)));
}

#[test]
fn approvals_are_role_bound() {
    let b = bridge();
    let role_a_key = &b.keys[0].1;

    // Role A's key cannot approve as role B.
    let call = SignedCall::sign(
        APPROVE_DOMAIN,
        ApproveCall {
            role: Role::RoleB,
            asset_id: AssetId(42),
        },
        role_a_key,
    )
    .unwrap();
    assert!(matches!(
        b.registry.approve_signed(&call),
        Err(RegistryError::NotAuthorized { .. })
    ));

    // A signature under another domain is not an approval.
    let call = SignedCall::sign(
        "amb.other.v1",
        ApproveCall {
            role: Role::RoleA,
            asset_id: AssetId(42),
        },
        role_a_key,
    )
    .unwrap();
    assert!(matches!(
        b.registry.approve_signed(&call),
        Err(RegistryError::Unauthenticated(_))
    ));

    // Double approval by the same role is rejected and changes nothing.
    b.approve(Role::RoleA, 42).unwrap();
    assert!(matches!(
        b.approve(Role::RoleA, 42),
        Err(RegistryError::AlreadyApproved { .. })
    ));
    assert_eq!(b.registry.get_approval_state(AssetId(42)).as_tuple(), (true, false, false, false));
}

#[test]
fn proof_for_42_cannot_mint_43() {
    let b = bridge();
    for role in Role::ALL {
        b.approve(role, 42).unwrap();
    }
    let proof = b
        .prover
        .prove(&WitnessBundle::from_flags(AssetId(42), true, true, true))
        .unwrap();

    // Proof bound to 42, submitted for 43 with 42's inputs.
    let err = b
        .gate
        .mint_with_proof(AssetId(43), &proof, &PublicInputs::for_asset(AssetId(42)), recipient())
        .unwrap_err();
    assert!(matches!(err, MintError::PublicInputMismatch { .. }));

    // Proof bound to 42, submitted for 43 with relabelled inputs.
    let err = b
        .gate
        .mint_with_proof(AssetId(43), &proof, &PublicInputs::for_asset(AssetId(43)), recipient())
        .unwrap_err();
    assert!(matches!(err, MintError::InvalidProof { .. }));

    assert!(!b.gate.is_minted(AssetId(43)));
    assert_eq!(b.gate.total_minted(), 0);

    // The proof still works for the asset it was made for.
    b.gate
        .mint_with_proof(AssetId(42), &proof, &PublicInputs::for_asset(AssetId(42)), recipient())
        .unwrap();
    assert!(b.gate.is_minted(AssetId(42)));
}

#[test]
fn unapproved_asset_has_no_proof() {
    let b = bridge();
    b.approve(Role::RoleA, 43).unwrap();
    b.approve(Role::RoleB, 43).unwrap();
    let attestor = RegistryAttestor::new(b.registry.clone());
    let err = attestor.witness_for(AssetId(43)).unwrap_err();
    assert_eq!(err, AttestationError::UnknownAsset(AssetId(43)));
    assert!(b
        .prover
        .prove(&WitnessBundle::from_flags(AssetId(43), true, true, false))
        .is_err());
}
