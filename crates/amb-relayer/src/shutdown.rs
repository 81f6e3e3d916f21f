//! # Shutdown Signal
//!
//! A `watch`-backed flag. The controller flips it once; every clone of the
//! signal observes the flip at its next suspension point. Suspension points
//! in the relayer (subscription waits, backoff sleeps, proof generation,
//! confirmation polls) race against [`ShutdownSignal::triggered`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Owner side of the shutdown flag.
#[derive(Debug)]
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// Observer side of the shutdown flag. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
    // Held only by `never()` signals, which have no controller.
    _detached: Option<Arc<watch::Sender<bool>>>,
}

impl ShutdownController {
    /// A controller and its first signal.
    pub fn channel() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ShutdownSignal { rx, _detached: None })
    }

    /// Another signal for the same controller.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            _detached: None,
        }
    }

    /// Request shutdown. Idempotent.
    pub fn shutdown(&self) {
        if !self.tx.send_replace(true) {
            tracing::info!("shutdown requested");
        }
    }
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _detached: Some(Arc::new(tx)),
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|stop| *stop).await.is_err() {
            // Controller dropped without requesting shutdown: never resolve.
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless shutdown arrives first.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.triggered() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep for `duration`; `false` if interrupted by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.guard(tokio::time::sleep(duration)).await.is_some()
    }
}
