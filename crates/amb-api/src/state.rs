//! # Application State
//!
//! Handles shared by every handler. The relayer view is always present;
//! the ledger handles are attached only when the API runs in the same
//! process as the ledgers (the local bridge), and ledger routes answer 503
//! otherwise.

use std::sync::Arc;

use amb_mint::MintGate;
use amb_registry::ApprovalRegistry;
use amb_relayer::RelayerView;
use metrics_exporter_prometheus::PrometheusHandle;

/// API settings.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Bearer token required on `/v1/*`. `None` disables authentication.
    pub auth_token: Option<String>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub relayer: Arc<dyn RelayerView>,
    pub registry: Option<Arc<ApprovalRegistry>>,
    pub gate: Option<Arc<MintGate>>,
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.config.auth_token.is_some())
            .field("registry", &self.registry.is_some())
            .field("gate", &self.gate.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// State serving only the relayer surface.
    pub fn new(relayer: Arc<dyn RelayerView>) -> Self {
        Self {
            config: ApiConfig::default(),
            relayer,
            registry: None,
            gate: None,
            metrics: None,
        }
    }

    /// Attach in-process ledgers for the read-only ledger routes.
    pub fn with_ledgers(mut self, registry: Arc<ApprovalRegistry>, gate: Arc<MintGate>) -> Self {
        self.registry = Some(registry);
        self.gate = Some(gate);
        self
    }

    /// Serve `/metrics` from an installed Prometheus recorder.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }
}
