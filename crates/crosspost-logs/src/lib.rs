//! # crosspost-logs
//!
//! Log aggregation and deduplication engine for Crosspost publishers.
//!
//! This crate provides:
//!
//! - [`LogRecord`] — Timestamped, per-platform log events
//! - [`LogLevel`] — Severity levels (Debug, Info, Success, Warn, Error)
//! - [`LogQuery`] — Keyword/platform/level filters with bounded results
//! - [`Deduplicator`] — Merges runs of equivalent consecutive events
//! - [`LogStore`] — Capacity-bounded storage with FIFO eviction
//! - [`LogEngine`] — The shared facade producers and readers call
//! - [`PlatformCollector`] — Per-platform producer handles
//! - [`LogStream`] — Async live tail of appended and merged records
//!
//! ## Example
//!
//! ```rust
//! use crosspost_logs::{shared_engine, LogLevel, LogQuery, LogStoreConfig};
//! use crosspost_config::SettingsStore;
//!
//! let engine = shared_engine(LogStoreConfig::default(), SettingsStore::in_memory());
//!
//! engine.emit("upload started", "bilibili", LogLevel::Info);
//! engine.emit("upload started", "bilibili", LogLevel::Info);
//!
//! // The repeat merged into one record.
//! let records = engine.query(&LogQuery::new().with_platform("bilibili"));
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].repeat_count, 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collector;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod sink;
pub mod store;
pub mod types;

// Re-export main types
pub use collector::{LineParser, PlatformCollector};
pub use dedup::{Admission, Deduplicator, RunKey};
pub use engine::{shared_engine, LogEngine, SharedEngine};
pub use error::{LogError, Result};
pub use sink::FileSink;
pub use store::{LogStore, LogStoreConfig, LogStream, SharedLogStore};
pub use types::{platform, LogLevel, LogQuery, LogRecord, DEFAULT_QUERY_LIMIT};
