//! One-shot broadcast signals.
//!
//! Used for server shutdown and for interrupting routers that are waiting
//! between selection attempts.

use tokio::sync::broadcast;

/// A broadcast trigger that any number of tasks can wait on.
#[derive(Debug)]
pub struct Signal {
    tx: broadcast::Sender<()>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before waiting: triggers sent earlier are not observed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Wake every current subscriber.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once Ctrl+C is received.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
