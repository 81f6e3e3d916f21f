//! # Running Bridge
//!
//! The relayer's event loop and the HTTP API together: approvals land
//! while the loop runs, and the API reports the relay through to
//! confirmation. Shutdown leaves a state file a restart can trust.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use amb_api::AppState;
use amb_core::{Address, AssetId, Role};
use amb_mint::MintGate;
use amb_registry::{ApprovalRegistry, RegistryAttestor, RoleTable};
use amb_relayer::{
    LocalMintTarget, LocalRegistryFeed, RelayPhase, RelayerConfig, RelayerError, RelayerService,
    RelayerView, ShutdownController, ShutdownSignal, StateFile,
};
use amb_zkp::MockProofSystem;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn recipient() -> Address {
    Address::from_bytes([0x5e; 20])
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

struct Running {
    registry: Arc<ApprovalRegistry>,
    gate: Arc<MintGate>,
    relayer: Arc<RelayerService<LocalRegistryFeed, LocalMintTarget>>,
}

fn start(state_path: std::path::PathBuf, shutdown: ShutdownSignal) -> Running {
    let roles = RoleTable::new(
        Address::from_bytes([0x0a; 20]),
        Address::from_bytes([0x0b; 20]),
        Address::from_bytes([0x0c; 20]),
    )
    .unwrap();
    let registry = Arc::new(ApprovalRegistry::new(roles));
    let prover = Arc::new(MockProofSystem::default());
    let gate = Arc::new(MintGate::new(Arc::new(prover.verifier())));
    let config = RelayerConfig {
        recipient: recipient(),
        poll_interval_ms: 5,
        confirmation_timeout_ms: 200,
        state_path: Some(state_path),
        ..RelayerConfig::default()
    };
    let relayer = RelayerService::new(
        config,
        LocalRegistryFeed::new(registry.clone()),
        LocalMintTarget::new(gate.clone()),
        prover,
        Arc::new(RegistryAttestor::new(registry.clone())),
        shutdown,
    )
    .unwrap();
    Running {
        registry,
        gate,
        relayer: Arc::new(relayer),
    }
}

impl Running {
    fn app(&self) -> axum::Router {
        let view: Arc<dyn RelayerView> = self.relayer.clone();
        amb_api::app(AppState::new(view).with_ledgers(self.registry.clone(), self.gate.clone()))
    }

    fn approve(&self, role: Role, asset: u64) {
        self.registry
            .approve_as(role, AssetId(asset), self.registry.role_holder(role))
            .unwrap();
    }

    async fn wait_for_phase(&self, asset: u64, phase: &str) -> serde_json::Value {
        let uri = format!("/v1/relays/{asset}");
        for _ in 0..400 {
            let response = self.app().oneshot(get(&uri)).await.unwrap();
            if response.status() == StatusCode::OK {
                let json = body_json(response).await;
                if json["phase"] == phase {
                    return json;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("asset {asset} never reached {phase}");
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approvals_flow_through_running_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("relayer-state.json");
    let (controller, signal) = ShutdownController::channel();
    let bridge = start(state_path.clone(), signal);
    let loop_handle = tokio::spawn(bridge.relayer.clone().run());

    // Partial approval: the relayer must not act.
    bridge.approve(Role::RoleA, 42);
    bridge.approve(Role::RoleB, 42);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let response = bridge.app().oneshot(get("/v1/relays/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let approval = body_json(bridge.app().oneshot(get("/v1/approvals/42")).await.unwrap()).await;
    assert_eq!(approval["aggregated"], false);

    // Third approval: relay to confirmation.
    bridge.approve(Role::RoleC, 42);
    let relay = bridge.wait_for_phase(42, "CONFIRMED").await;
    assert_eq!(relay["proving_attempts"], 1);
    let history: Vec<&str> = relay["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["to"].as_str().unwrap())
        .collect();
    assert_eq!(
        history,
        vec!["NOTIFIED", "PROVING", "SUBMITTING", "CONFIRMING", "CONFIRMED"]
    );

    let mint = body_json(bridge.app().oneshot(get("/v1/mints/42")).await.unwrap()).await;
    assert_eq!(mint["minted"], true);
    assert_eq!(mint["owner"], recipient().to_hex());

    let health = body_json(bridge.app().oneshot(get("/v1/health")).await.unwrap()).await;
    assert_eq!(health["healthy"], true);
    let ready = bridge.app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    controller.shutdown();
    loop_handle.await.unwrap().unwrap();
    assert!(matches!(
        bridge.relayer.clone().run().await,
        Err(RelayerError::AlreadyRunning)
    ));

    let persisted = StateFile::new(&state_path).load().unwrap();
    assert_eq!(persisted.registry_cursor, bridge.registry.event_head());
    assert_eq!(persisted.assets[&AssetId(42)].phase, RelayPhase::Confirmed);
    assert_eq!(bridge.gate.balance_of(recipient(), AssetId(42)), 1);
}

#[tokio::test]
async fn shutdown_before_any_event_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, signal) = ShutdownController::channel();
    let bridge = start(dir.path().join("relayer-state.json"), signal);
    let handle = tokio::spawn(bridge.relayer.clone().run());
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(bridge.gate.total_minted(), 0);
}
