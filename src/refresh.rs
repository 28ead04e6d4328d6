//! Background catalog refresh
//!
//! Reloads the catalog through a [`CacheGate`] on a fixed interval and reports
//! each result to the owner over a tokio channel. The spawned task is the only
//! caller of its gate, so loads never overlap.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::gate::{CacheGate, LoadOutcome};
use crate::source::CatalogSource;
use crate::store::KeyValueStore;

/// Messages sent from background refresh to the owner
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Refresh started
    RefreshStarted,
    /// A load finished with a snapshot
    Loaded(LoadOutcome),
    /// A load failed with nothing to serve
    RefreshError(String),
}

/// Configuration for refresh intervals
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between reloads
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60), // matches the freshness window
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task for `gate`
    ///
    /// The first reload happens one interval after spawning; the caller is
    /// expected to have done the initial load itself.
    pub fn spawn<S, K>(gate: Arc<CacheGate<S, K>>, config: RefreshConfig) -> Self
    where
        S: CatalogSource + 'static,
        K: KeyValueStore + 'static,
    {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            let interval = config.interval;

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // Skip the first tick (immediate)
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if msg_tx.send(RefreshMessage::RefreshStarted).await.is_err() {
                                break;
                            }

                            let message = match gate.load().await {
                                Ok(outcome) => RefreshMessage::Loaded(outcome),
                                Err(err) => RefreshMessage::RefreshError(err.to_string()),
                            };

                            if msg_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("refresh task shutting down");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message; `None` once the task has stopped
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
