//! Caller-owned holder for the current catalog snapshot
//!
//! Consumers register listeners that run after every successful load, and
//! notice handlers that receive a user-facing message whenever an offline
//! copy was served instead of fresh data.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::data::CatalogSnapshot;
use crate::gate::{CacheGate, LoadError, LoadOrigin, LoadOutcome};
use crate::source::CatalogSource;
use crate::store::KeyValueStore;

/// Callback run with the new snapshot after each load
pub type Listener = Box<dyn Fn(&CatalogSnapshot) + Send + Sync>;

/// Callback receiving the offline notice text
pub type NoticeHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Holds the latest snapshot and dispatches it to registered listeners
#[derive(Default)]
pub struct Catalog {
    snapshot: Option<CatalogSnapshot>,
    degraded: bool,
    listeners: Vec<Listener>,
    notice_handlers: Vec<NoticeHandler>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("snapshot", &self.snapshot)
            .field("degraded", &self.degraded)
            .field("listeners", &self.listeners.len())
            .field("notice_handlers", &self.notice_handlers.len())
            .finish()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener; listeners run in registration order
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&CatalogSnapshot) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Registers a handler for the offline notice
    pub fn on_degraded<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.notice_handlers.push(Box::new(handler));
    }

    /// The latest snapshot, if any load has succeeded
    pub fn snapshot(&self) -> Option<&CatalogSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether the latest snapshot is an offline copy
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Replaces the snapshot with a load result and notifies listeners
    ///
    /// Notice handlers run after the listeners, and only for degraded outcomes.
    pub fn apply(&mut self, outcome: LoadOutcome) {
        self.degraded = outcome.is_degraded();
        let snapshot: &CatalogSnapshot = self.snapshot.insert(outcome.snapshot);

        for listener in &self.listeners {
            listener(snapshot);
        }

        if self.degraded {
            let notice = offline_notice(snapshot.captured_at);
            for handler in &self.notice_handlers {
                handler(&notice);
            }
        }
    }

    /// Loads through the gate and applies the result
    ///
    /// On error the previous snapshot is kept and no callbacks run.
    pub async fn refresh<S, K>(&mut self, gate: &CacheGate<S, K>) -> Result<LoadOrigin, LoadError>
    where
        S: CatalogSource,
        K: KeyValueStore,
    {
        let outcome = gate.load().await?;
        let origin = outcome.origin;
        self.apply(outcome);
        Ok(origin)
    }
}

/// Message shown when an offline copy replaces fresh data
pub fn offline_notice(captured_at: DateTime<Utc>) -> String {
    if captured_at == DateTime::<Utc>::UNIX_EPOCH {
        "Network is unavailable; showing offline catalog data".to_string()
    } else {
        format!(
            "Network is unavailable; showing offline catalog data from {}",
            captured_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}
