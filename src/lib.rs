//! scentdb library
//!
//! Loads a product catalog from a published spreadsheet CSV export, caches it
//! in a local key/value store, and hands parsed records to registered
//! listeners. The binary in `main.rs` is a thin CLI over these modules.

pub mod catalog;
pub mod cli;
pub mod data;
pub mod gate;
pub mod refresh;
pub mod render;
pub mod source;
pub mod store;

pub use catalog::Catalog;
pub use data::{parse, CatalogRecord, CatalogSnapshot, FieldValue};
pub use gate::{CacheGate, GateConfig, LoadError, LoadOrigin, LoadOutcome};
pub use source::{CatalogSource, FetchError, HttpSource};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
