//! Ledger reachability tracking.
//!
//! Every successful call through a port marks its link reachable; every
//! transport failure records the error. A link is healthy when it was
//! reached within the staleness window.

use std::time::Duration;

use amb_core::Timestamp;
use parking_lot::RwLock;
use serde::Serialize;

/// The two ledger connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    /// Permissioned ledger (approval registry).
    Permissioned,
    /// Public ledger (mint gate).
    Public,
}

impl Link {
    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissioned => "permissioned",
            Self::Public => "public",
        }
    }
}

/// Reachability of one link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkHealth {
    /// Reached within the staleness window.
    pub reachable: bool,
    /// Last successful call.
    pub last_ok: Option<Timestamp>,
    /// Last transport error, if any since the last success.
    pub last_error: Option<String>,
}

/// Relayer health as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Both links reachable.
    pub healthy: bool,
    /// Permissioned ledger link.
    pub permissioned: LinkHealth,
    /// Public ledger link.
    pub public: LinkHealth,
    /// Assets currently in flight.
    pub in_flight: usize,
    /// Assets stopped in `Failed`.
    pub failed: usize,
    /// Assets confirmed.
    pub confirmed: usize,
}

#[derive(Debug, Default)]
struct LinkState {
    last_ok: Option<Timestamp>,
    last_error: Option<String>,
}

/// Records link outcomes.
#[derive(Debug)]
pub struct HealthTracker {
    staleness: Duration,
    permissioned: RwLock<LinkState>,
    public: RwLock<LinkState>,
}

impl HealthTracker {
    /// Tracker treating links silent for longer than `staleness` as down.
    pub fn new(staleness: Duration) -> Self {
        Self {
            staleness,
            permissioned: RwLock::new(LinkState::default()),
            public: RwLock::new(LinkState::default()),
        }
    }

    fn slot(&self, link: Link) -> &RwLock<LinkState> {
        match link {
            Link::Permissioned => &self.permissioned,
            Link::Public => &self.public,
        }
    }

    /// A call over `link` succeeded.
    pub fn record_ok(&self, link: Link) {
        let mut state = self.slot(link).write();
        state.last_ok = Some(Timestamp::now());
        state.last_error = None;
    }

    /// A call over `link` failed in transport.
    pub fn record_error(&self, link: Link, error: impl std::fmt::Display) {
        let message = error.to_string();
        tracing::warn!(link = link.as_str(), error = %message, "ledger call failed");
        metrics::counter!("amb_relayer_link_errors_total", "link" => link.as_str()).increment(1);
        self.slot(link).write().last_error = Some(message);
    }

    /// Current view of `link`.
    pub fn link(&self, link: Link) -> LinkHealth {
        let state = self.slot(link).read();
        let reachable = state.last_ok.is_some_and(|at| {
            let age = Timestamp::now()
                .as_datetime()
                .signed_duration_since(*at.as_datetime());
            age.to_std().map_or(true, |age| age <= self.staleness)
        });
        LinkHealth {
            reachable,
            last_ok: state.last_ok,
            last_error: state.last_error.clone(),
        }
    }

    /// Assemble a report with the caller's phase counts.
    pub fn report(&self, in_flight: usize, failed: usize, confirmed: usize) -> HealthReport {
        let permissioned = self.link(Link::Permissioned);
        let public = self.link(Link::Public);
        HealthReport {
            healthy: permissioned.reachable && public.reachable,
            permissioned,
            public,
            in_flight,
            failed,
            confirmed,
        }
    }
}
