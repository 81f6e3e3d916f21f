//! # Run Subcommand
//!
//! `amb run` starts a complete local bridge in one process:
//!
//! 1. the approval registry (permissioned ledger) with the role table
//!    derived from the approver keys,
//! 2. the mint gate (public ledger) with the mock verifier,
//! 3. the relayer saga following the registry,
//! 4. the HTTP API with a Prometheus scrape endpoint.
//!
//! `--demo` submits signed approvals for the given assets from all three
//! roles once the bridge is up. Ctrl-C shuts the relayer and API down
//! gracefully; the relayer persists its state on the way out.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::task::{JoinError, JoinSet};

use amb_api::{ApiConfig, AppState};
use amb_core::{Address, AssetId, DeploymentRecord};
use amb_ledger::SignedCall;
use amb_mint::MintGate;
use amb_registry::{ApprovalRegistry, ApproveCall, RegistryAttestor, APPROVE_DOMAIN};
use amb_relayer::{
    LocalMintTarget, LocalRegistryFeed, RelayerConfig, RelayerService, RelayerView,
    ShutdownController,
};
use amb_zkp::{MockProofSystem, ProofService};

use crate::deploy::check_local;
use crate::keys::RoleKeys;

/// Arguments for `amb run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Relayer configuration file (YAML or JSON). `AMB_*` environment
    /// variables override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Deployment record. Defaults to the config's `deployment_path`,
    /// then `deployment.json`.
    #[arg(long)]
    pub deployment: Option<PathBuf>,

    /// Directory holding the approver role keys.
    #[arg(long, default_value = "keys")]
    pub keys_dir: PathBuf,

    /// Address receiving minted tokens. Overrides the config.
    #[arg(long)]
    pub recipient: Option<Address>,

    /// API listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Require this bearer token on `/v1/*`.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Approve these assets from every role after startup.
    #[arg(long, value_delimiter = ',')]
    pub demo: Vec<u64>,
}

/// Execute `amb run`. Blocks until Ctrl-C or until the relayer or API
/// stops on its own.
pub fn run_bridge(args: &RunArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(serve_bridge(args))
}

/// Resolve the relayer configuration from file, environment, and flags.
pub fn resolve_config(args: &RunArgs) -> Result<RelayerConfig> {
    resolve_config_with(args, |var| std::env::var(var).ok())
}

/// [`resolve_config`] reading `AMB_*` variables through `lookup`.
pub fn resolve_config_with(args: &RunArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<RelayerConfig> {
    let mut config = match &args.config {
        Some(path) => RelayerConfig::from_file(path, &lookup)?,
        None => {
            let mut config = RelayerConfig::default();
            config.apply_env(&lookup)?;
            config
        }
    };
    if let Some(recipient) = args.recipient {
        config.recipient = recipient;
    }
    if config.deployment_path.is_none() || args.deployment.is_some() {
        config.deployment_path = Some(
            args.deployment
                .clone()
                .unwrap_or_else(|| PathBuf::from("deployment.json")),
        );
    }
    config.validate()?;
    Ok(config)
}

async fn serve_bridge(args: &RunArgs) -> Result<u8> {
    let config = resolve_config(args)?;
    let prover = Arc::new(MockProofSystem::default());

    let deployment_path = config
        .deployment_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("deployment.json"));
    let record = DeploymentRecord::load(&deployment_path)?;
    check_local(&record, prover.circuit_id())
        .with_context(|| format!("checking {}", deployment_path.display()))?;

    let keys = RoleKeys::load(&args.keys_dir)?;
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let registry = Arc::new(ApprovalRegistry::new(keys.role_table()?));
    let gate = Arc::new(MintGate::new(Arc::new(prover.verifier())));

    let (controller, shutdown) = ShutdownController::channel();
    let relayer = Arc::new(RelayerService::new(
        config,
        LocalRegistryFeed::new(registry.clone()),
        LocalMintTarget::new(gate.clone()),
        prover,
        Arc::new(RegistryAttestor::new(registry.clone())),
        shutdown.clone(),
    )?);

    let view: Arc<dyn RelayerView> = relayer.clone();
    let state = AppState::new(view)
        .with_ledgers(registry.clone(), gate.clone())
        .with_metrics(metrics)
        .with_config(ApiConfig {
            auth_token: args.api_token.clone(),
        });

    let mut tasks: JoinSet<(&'static str, Result<()>)> = JoinSet::new();
    tasks.spawn(async move { ("relayer", relayer.run().await.map_err(Into::into)) });
    let listen = args.listen;
    let api_shutdown = shutdown.clone();
    tasks.spawn(async move {
        let served = amb_api::serve(listen, state, async move { api_shutdown.triggered().await }).await;
        ("api", served.with_context(|| format!("serving API on {listen}")))
    });

    for asset in &args.demo {
        approve_all(&registry, &keys, AssetId(*asset))?;
    }

    tracing::info!(%listen, "bridge running; press Ctrl-C to stop");
    let mut exit = 0;
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            tracing::info!("shutdown requested");
        }
        Some(joined) = tasks.join_next() => {
            report(joined);
            tracing::error!("bridge component stopped unexpectedly");
            exit = 1;
        }
    }

    controller.shutdown();
    while let Some(joined) = tasks.join_next().await {
        if !report(joined) {
            exit = 1;
        }
    }
    tracing::info!(
        minted = gate.total_minted(),
        registry_height = registry.block_height(),
        "bridge stopped"
    );
    Ok(exit)
}

/// Submit a signed approval for `asset` from every role.
pub fn approve_all(registry: &ApprovalRegistry, keys: &RoleKeys, asset: AssetId) -> Result<()> {
    for (role, key) in keys.iter() {
        let call = SignedCall::sign(APPROVE_DOMAIN, ApproveCall { role, asset_id: asset }, key)?;
        registry
            .approve_signed(&call)
            .with_context(|| format!("approving {asset} as {role}"))?;
    }
    tracing::info!(%asset, "demo approvals submitted");
    Ok(())
}

fn report(joined: Result<(&'static str, Result<()>), JoinError>) -> bool {
    match joined {
        Ok((name, Ok(()))) => {
            tracing::debug!(task = name, "task finished");
            true
        }
        Ok((name, Err(e))) => {
            tracing::error!(task = name, "{e:#}");
            false
        }
        Err(e) => {
            tracing::error!("task panicked: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amb_core::Role;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            deployment: None,
            keys_dir: PathBuf::from("keys"),
            recipient: Some(Address::from_bytes([0x5e; 20])),
            listen: "127.0.0.1:0".parse().unwrap(),
            api_token: None,
            demo: Vec::new(),
        }
    }

    #[test]
    fn recipient_flag_fills_config() {
        let config = resolve_config_with(&args(), no_env).unwrap();
        assert_eq!(config.recipient, Address::from_bytes([0x5e; 20]));
        assert_eq!(config.deployment_path, Some(PathBuf::from("deployment.json")));
    }

    #[test]
    fn zero_recipient_rejected() {
        let mut args = args();
        args.recipient = Some(Address::ZERO);
        assert!(resolve_config_with(&args, no_env).is_err());
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.yaml");
        std::fs::write(
            &path,
            "recipient: \"0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e\"\npoll_interval_ms: 250\ndeployment_path: custom.json\n",
        )
        .unwrap();
        let mut args = args();
        args.recipient = None;
        args.config = Some(path);
        let config = resolve_config_with(&args, no_env).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.deployment_path, Some(PathBuf::from("custom.json")));
    }

    #[test]
    fn env_overrides_apply_before_flags() {
        let env = |var: &str| match var {
            "AMB_RECIPIENT" => Some("0x1111111111111111111111111111111111111111".to_string()),
            "AMB_POLL_INTERVAL_MS" => Some("40".to_string()),
            "AMB_DEPLOYMENT_PATH" => Some("env.json".to_string()),
            _ => None,
        };
        let config = resolve_config_with(&args(), env).unwrap();
        assert_eq!(config.recipient, Address::from_bytes([0x5e; 20]));
        assert_eq!(config.poll_interval_ms, 40);
        assert_eq!(config.deployment_path, Some(PathBuf::from("env.json")));

        let mut args = args();
        args.recipient = None;
        let config = resolve_config_with(&args, env).unwrap();
        assert_eq!(config.recipient, Address::from_bytes([0x11; 20]));
    }

    #[test]
    fn recipient_flag_completes_a_file_without_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.json");
        std::fs::write(&path, "{\"poll_interval_ms\": 100}").unwrap();
        let mut args = args();
        args.config = Some(path);
        let config = resolve_config_with(&args, no_env).unwrap();
        assert_eq!(config.recipient, Address::from_bytes([0x5e; 20]));
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn demo_approvals_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let keys = RoleKeys::load_or_generate(dir.path(), false).unwrap();
        let registry = ApprovalRegistry::new(keys.role_table().unwrap());
        approve_all(&registry, &keys, AssetId(42)).unwrap();
        let state = registry.get_approval_state(AssetId(42));
        assert!(state.all_approved());
        assert!(state.aggregated);
        assert!(state.flag(Role::RoleC));
        assert!(approve_all(&registry, &keys, AssetId(42)).is_err());
    }
}
