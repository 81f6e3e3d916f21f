//! # Deployment Record
//!
//! A small persisted mapping from logical component name to the network
//! location where that component lives. Written by deployment tooling,
//! read by the relayer at startup. It is a configuration artifact, not
//! protocol state: nothing in the bridge's correctness depends on it beyond
//! locating the two ledgers' components.
//!
//! ```json
//! {
//!   "network": "local",
//!   "components": {
//!     "approvalRegistry": "permissioned://registry",
//!     "mintGate": "public://mint-gate",
//!     "verifier": "public://verifier"
//!   },
//!   "created_at": "2026-01-15T12:00:00Z"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::temporal::Timestamp;

/// The logical components that appear in a deployment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Component {
    /// The approval registry on the permissioned ledger.
    ApprovalRegistry,
    /// The proof verifier embedded in the public ledger.
    Verifier,
    /// The mint gate on the public ledger.
    MintGate,
}

impl Component {
    /// All components, in record order.
    pub const ALL: [Component; 3] = [
        Component::ApprovalRegistry,
        Component::Verifier,
        Component::MintGate,
    ];

    /// The key under which this component is stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalRegistry => "approvalRegistry",
            Self::Verifier => "verifier",
            Self::MintGate => "mintGate",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reading or writing a deployment record.
#[derive(Error, Debug)]
pub enum DeploymentError {
    /// The record file could not be read or written.
    #[error("deployment record io error at {path}: {source}")]
    Io {
        /// Path of the record file.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The record file was not valid JSON of the expected shape.
    #[error("deployment record at {path} is malformed: {source}")]
    Parse {
        /// Path of the record file.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A component the caller needs has no recorded location.
    #[error("deployment record has no location for component {0}")]
    MissingComponent(Component),
}

/// Persisted component locations for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Free-form network label (e.g. `local`, `testnet`).
    pub network: String,
    /// Location of each deployed component.
    pub components: BTreeMap<Component, String>,
    /// When the record was written.
    pub created_at: Timestamp,
}

impl DeploymentRecord {
    /// An empty record for `network`.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            components: BTreeMap::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Record the location of `component`, replacing any previous value.
    pub fn set(&mut self, component: Component, location: impl Into<String>) {
        self.components.insert(component, location.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, component: Component, location: impl Into<String>) -> Self {
        self.set(component, location);
        self
    }

    /// Location of `component`, if recorded.
    pub fn get(&self, component: Component) -> Option<&str> {
        self.components.get(&component).map(String::as_str)
    }

    /// Location of `component`, or [`DeploymentError::MissingComponent`].
    pub fn require(&self, component: Component) -> Result<&str, DeploymentError> {
        self.get(component)
            .ok_or(DeploymentError::MissingComponent(component))
    }

    /// Components with no recorded location.
    pub fn missing(&self) -> Vec<Component> {
        Component::ALL
            .into_iter()
            .filter(|c| !self.components.contains_key(c))
            .collect()
    }

    /// Read a record from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DeploymentError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| DeploymentError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| DeploymentError::Parse {
            path: display,
            source,
        })
    }

    /// Write the record as pretty JSON.
    ///
    /// The file is written to a sibling temporary path and renamed into
    /// place, so readers never observe a half-written record.
    pub fn save(&self, path: &Path) -> Result<(), DeploymentError> {
        let display = path.display().to_string();
        let io_err = |source| DeploymentError::Io {
            path: display.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| DeploymentError::Parse {
            path: display.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
