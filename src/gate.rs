//! Cache gate deciding between the stored catalog and a fresh download
//!
//! Entries are stored under version-tagged keys: `catalog_data_<tag>` holds
//! the records as JSON and `catalog_time_<tag>` holds the capture time in
//! Unix milliseconds. Bumping the tag invalidates every earlier entry for the
//! fresh-cache path while keeping it available as an offline fallback.

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{parse_with, CatalogRecord, CatalogSnapshot, ParseMode};
use crate::source::{CatalogSource, FetchError};
use crate::store::KeyValueStore;

/// Version tag of the current record shape
pub const DEFAULT_VERSION_TAG: &str = "v4";

/// Freshness window in seconds (1 minute)
pub const DEFAULT_FRESHNESS_SECS: i64 = 60;

/// Earlier version tags still probed when falling back to offline data
const LEGACY_VERSION_TAGS: [&str; 3] = ["v3", "v2", "v1"];

/// Errors that can occur when loading the catalog
#[derive(Debug, Error)]
pub enum LoadError {
    /// Fetch failed and no readable stored catalog exists
    #[error("Catalog unavailable and no offline copy is stored: {0}")]
    Unavailable(#[source] FetchError),
}

/// Configuration for cache keys and expiry
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Tag embedded in cache keys
    pub version_tag: String,
    /// Maximum age of a cached entry before a refresh is attempted
    pub freshness_window: Duration,
    /// Older tags whose entries may still serve as an offline fallback
    pub legacy_tags: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            version_tag: DEFAULT_VERSION_TAG.to_string(),
            freshness_window: Duration::seconds(DEFAULT_FRESHNESS_SECS),
            legacy_tags: LEGACY_VERSION_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Store key for serialized records under a version tag
pub fn data_key(tag: &str) -> String {
    format!("catalog_data_{}", tag)
}

/// Store key for the capture timestamp under a version tag
pub fn time_key(tag: &str) -> String {
    format!("catalog_time_{}", tag)
}

/// Where a loaded snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Fresh entry from the store
    Cache,
    /// Downloaded and parsed during this load
    Network,
    /// Stale stored entry served because the download failed
    StaleFallback,
}

/// A loaded snapshot together with its origin
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub snapshot: CatalogSnapshot,
    pub origin: LoadOrigin,
}

impl LoadOutcome {
    /// True when stale data is being served in place of a fresh download
    pub fn is_degraded(&self) -> bool {
        self.origin == LoadOrigin::StaleFallback
    }
}

/// Loads the catalog from the store when fresh, otherwise from the source
#[derive(Debug)]
pub struct CacheGate<S, K> {
    source: S,
    store: K,
    config: GateConfig,
}

impl<S: CatalogSource, K: KeyValueStore> CacheGate<S, K> {
    /// Creates a gate with the default configuration
    pub fn new(source: S, store: K) -> Self {
        Self::with_config(source, store, GateConfig::default())
    }

    pub fn with_config(source: S, store: K, config: GateConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Loads the catalog as of the current time
    pub async fn load(&self) -> Result<LoadOutcome, LoadError> {
        self.load_at(Utc::now()).await
    }

    /// Loads the catalog as of `now`
    ///
    /// # Behavior
    /// - Returns the stored catalog if it is younger than the freshness window
    /// - A corrupt or undated stored catalog counts as a miss
    /// - Otherwise downloads, parses and stores a new catalog
    /// - On download failure returns any stored catalog regardless of age,
    ///   marked [`LoadOrigin::StaleFallback`]
    /// - Fails only when the download fails and nothing readable is stored
    pub async fn load_at(&self, now: DateTime<Utc>) -> Result<LoadOutcome, LoadError> {
        // Stored timestamps have millisecond precision.
        let now = now.trunc_subsecs(3);

        if let Some(snapshot) = self.read_fresh(now) {
            debug!(records = snapshot.len(), "using cached catalog");
            return Ok(LoadOutcome {
                snapshot,
                origin: LoadOrigin::Cache,
            });
        }

        match self.source.fetch_text().await {
            Ok(text) => {
                let report = parse_with(&text, ParseMode::Lenient);
                if report.short_rows > 0 || report.long_rows > 0 {
                    debug!(
                        short_rows = report.short_rows,
                        long_rows = report.long_rows,
                        "catalog contained malformed rows"
                    );
                }

                let snapshot = CatalogSnapshot::new(report.records, now);
                self.persist(&snapshot);
                info!(records = snapshot.len(), "catalog downloaded");

                Ok(LoadOutcome {
                    snapshot,
                    origin: LoadOrigin::Network,
                })
            }
            Err(fetch_error) => {
                warn!(error = %fetch_error, "catalog download failed");
                match self.read_fallback() {
                    Some(snapshot) => {
                        warn!(
                            records = snapshot.len(),
                            captured_at = %snapshot.captured_at,
                            "serving offline catalog"
                        );
                        Ok(LoadOutcome {
                            snapshot,
                            origin: LoadOrigin::StaleFallback,
                        })
                    }
                    None => Err(LoadError::Unavailable(fetch_error)),
                }
            }
        }
    }

    /// Reads the current-tag entry if it is younger than the freshness window
    fn read_fresh(&self, now: DateTime<Utc>) -> Option<CatalogSnapshot> {
        let tag = &self.config.version_tag;
        let data = self.store.get(&data_key(tag))?;

        let Some(captured_at) = self.read_timestamp(tag) else {
            debug!(tag = %tag, "cached catalog has no readable timestamp");
            return None;
        };

        let age = now - captured_at;
        if age >= self.config.freshness_window {
            debug!(age_secs = age.num_seconds(), "cached catalog expired");
            return None;
        }

        match serde_json::from_str::<Vec<CatalogRecord>>(&data) {
            Ok(records) => Some(CatalogSnapshot::new(records, captured_at)),
            Err(err) => {
                warn!(error = %err, "cached catalog is corrupt, downloading again");
                None
            }
        }
    }

    /// Reads the first readable entry under the current or a legacy tag, ignoring age
    fn read_fallback(&self) -> Option<CatalogSnapshot> {
        let tags = std::iter::once(&self.config.version_tag).chain(&self.config.legacy_tags);

        for tag in tags {
            let Some(data) = self.store.get(&data_key(tag)) else {
                continue;
            };
            match serde_json::from_str::<Vec<CatalogRecord>>(&data) {
                Ok(records) => {
                    let captured_at = self.read_timestamp(tag).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                    debug!(tag = %tag, "found offline catalog");
                    return Some(CatalogSnapshot::new(records, captured_at));
                }
                Err(err) => {
                    warn!(tag = %tag, error = %err, "offline catalog is corrupt");
                }
            }
        }

        None
    }

    fn read_timestamp(&self, tag: &str) -> Option<DateTime<Utc>> {
        let raw = self.store.get(&time_key(tag))?;
        let millis = raw.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Writes the snapshot under the current tag; failures are logged only
    fn persist(&self, snapshot: &CatalogSnapshot) {
        let tag = &self.config.version_tag;

        let json = match serde_json::to_string(&snapshot.records) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize catalog for caching");
                return;
            }
        };

        let result = self
            .store
            .set(&data_key(tag), &json)
            .and_then(|_| {
                self.store.set(
                    &time_key(tag),
                    &snapshot.captured_at.timestamp_millis().to_string(),
                )
            });

        if let Err(err) = result {
            warn!(error = %err, "failed to cache catalog");
        }
    }
}
