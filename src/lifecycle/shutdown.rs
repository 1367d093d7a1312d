//! Graceful shutdown signalling.

use tokio::sync::broadcast;

/// Hand-off point between whoever decides to stop (a signal handler, a test
/// harness) and the tasks that must wind down.
///
/// Each server gets its own receiver via [`Shutdown::subscribe`] and passes
/// it to `GatewayServer::run_until`; a single [`Shutdown::trigger`] wakes
/// every receiver at once.
#[derive(Debug, Clone)]
pub struct Shutdown {
    signal: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (signal, _) = broadcast::channel(1);
        Self { signal }
    }

    /// A receiver that resolves once [`Shutdown::trigger`] has been called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.signal.subscribe()
    }

    /// Wake every current subscriber. Receivers must be obtained before
    /// this is called; the channel does not replay for late arrivals.
    pub fn trigger(&self) {
        let _ = self.signal.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
