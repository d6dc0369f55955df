//! The engine facade producers and readers share.
//!
//! This module provides:
//! - [`LogEngine`] — One store, one settings store, an optional file sink
//! - [`SharedEngine`] / [`shared_engine`] — The process-wide shared handle
//!
//! There is no hidden global: the application constructs one engine at
//! startup and hands the `Arc` to every producer and reader. Every
//! operation here is total — the engine never fails its caller.

use std::sync::Arc;

use chrono::Utc;
use crosspost_config::SettingsStore;
use tracing::warn;

use crate::sink::FileSink;
use crate::store::{LogStore, LogStoreConfig, LogStream};
use crate::types::{LogLevel, LogQuery, LogRecord};

/// Log aggregation engine: applies the deduplication policy to emitted
/// events and serves filtered, bounded queries.
pub struct LogEngine {
    store: LogStore,
    settings: SettingsStore,
    sink: Option<FileSink>,
}

impl LogEngine {
    /// Creates an engine with the given store configuration and settings.
    #[must_use]
    pub fn new(config: LogStoreConfig, settings: SettingsStore) -> Self {
        Self {
            store: LogStore::with_config(config),
            settings,
            sink: None,
        }
    }

    /// Creates an engine with default capacity and unpersisted settings.
    /// Suitable for tests and embedders that manage persistence elsewhere.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(LogStoreConfig::default(), SettingsStore::in_memory())
    }

    /// Attaches a file sink; every emitted event is mirrored to it.
    #[must_use]
    pub fn with_sink(mut self, sink: FileSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Emits one event, stamped now, under the current dedup policy.
    ///
    /// Cannot fail observably: sink errors are logged and swallowed, and
    /// a full store evicts silently.
    pub fn emit(&self, message: impl Into<String>, platform: impl Into<String>, level: LogLevel) {
        let record = LogRecord::new(message, platform, level, Utc::now());

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.write(&record) {
                warn!(error = %e, "log sink write failed");
            }
        }

        self.store.append(record, self.settings.dedup_enabled());
    }

    /// Emits an unscoped debug event.
    pub fn debug(&self, message: impl Into<String>) {
        self.emit(message, "", LogLevel::Debug);
    }

    /// Emits an unscoped info event.
    pub fn info(&self, message: impl Into<String>) {
        self.emit(message, "", LogLevel::Info);
    }

    /// Emits an unscoped success event.
    pub fn success(&self, message: impl Into<String>) {
        self.emit(message, "", LogLevel::Success);
    }

    /// Emits an unscoped warning event.
    pub fn warn(&self, message: impl Into<String>) {
        self.emit(message, "", LogLevel::Warn);
    }

    /// Emits an unscoped error event.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(message, "", LogLevel::Error);
    }

    /// Queries stored records, newest first, capped by the query's limit.
    /// Returns an empty vec when nothing matches, never an error.
    #[must_use]
    pub fn query(&self, query: &LogQuery) -> Vec<LogRecord> {
        self.store.query(query)
    }

    /// Distinct platforms with at least one stored record, sorted.
    #[must_use]
    pub fn platforms(&self) -> Vec<String> {
        self.store.platforms()
    }

    /// Sets the deduplication switch, persisting it for future runs.
    /// Takes effect for the next emitted event; already-stored records
    /// keep their merge state.
    pub fn set_dedup_enabled(&self, enabled: bool) {
        self.settings.set_dedup_enabled(enabled);
    }

    /// Returns the deduplication switch; `true` until ever set.
    #[must_use]
    pub fn is_dedup_enabled(&self) -> bool {
        self.settings.dedup_enabled()
    }

    /// Creates a live stream of records matching the filter.
    #[must_use]
    pub fn tail(&self, query: LogQuery) -> LogStream {
        self.store.tail(query)
    }

    /// Removes all stored records.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Shared engine handle.
pub type SharedEngine = Arc<LogEngine>;

/// Creates the shared engine instance handed to producers and readers.
#[must_use]
pub fn shared_engine(config: LogStoreConfig, settings: SettingsStore) -> SharedEngine {
    Arc::new(LogEngine::new(config, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::platform;

    #[test]
    fn dedup_defaults_to_enabled() {
        let engine = LogEngine::in_memory();
        assert!(engine.is_dedup_enabled());
    }

    #[test]
    fn set_dedup_enabled_round_trips() {
        let engine = LogEngine::in_memory();
        engine.set_dedup_enabled(false);
        assert!(!engine.is_dedup_enabled());
    }

    #[test]
    fn dedup_setting_survives_engine_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let engine = LogEngine::new(LogStoreConfig::default(), SettingsStore::new(dir.path()));
            engine.set_dedup_enabled(false);
        }
        {
            let engine = LogEngine::new(LogStoreConfig::default(), SettingsStore::new(dir.path()));
            assert!(!engine.is_dedup_enabled());
        }
    }

    #[test]
    fn emit_applies_the_current_policy() {
        let engine = LogEngine::in_memory();
        engine.emit("retrying", platform::DOUYIN, LogLevel::Warn);
        engine.emit("retrying", platform::DOUYIN, LogLevel::Warn);
        assert_eq!(engine.len(), 1);

        engine.set_dedup_enabled(false);
        engine.emit("retrying", platform::DOUYIN, LogLevel::Warn);
        engine.emit("retrying", platform::DOUYIN, LogLevel::Warn);
        assert_eq!(engine.len(), 3);
    }

    #[test]
    fn level_helpers_emit_unscoped_records() {
        let engine = LogEngine::in_memory();
        engine.debug("d");
        engine.info("i");
        engine.success("s");
        engine.warn("w");
        engine.error("e");

        assert_eq!(engine.len(), 5);
        assert!(engine.platforms().is_empty());

        let errors = engine.query(&LogQuery::new().with_level(LogLevel::Error));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "e");
    }

    #[test]
    fn query_is_total_on_malformed_filters() {
        let engine = LogEngine::in_memory();
        engine.info("hello");

        assert!(engine.query(&LogQuery::new().with_level_name("loud")).is_empty());
        assert!(engine
            .query(&LogQuery::new().with_platform("myspace"))
            .is_empty());
    }

    #[test]
    fn clear_empties_the_engine() {
        let engine = LogEngine::in_memory();
        engine.emit("m", platform::TIKTOK, LogLevel::Info);
        assert!(!engine.is_empty());

        engine.clear();
        assert!(engine.is_empty());
        assert!(engine.platforms().is_empty());
    }

    #[test]
    fn shared_engine_is_one_instance() {
        let engine = shared_engine(LogStoreConfig::default(), SettingsStore::in_memory());
        let producer = Arc::clone(&engine);

        producer.emit("from producer", platform::KUAISHOU, LogLevel::Info);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn sink_mirrors_emitted_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileSink::new(dir.path()).expect("sink");
        let path = sink.path().to_path_buf();
        let engine = LogEngine::in_memory().with_sink(sink);

        engine.emit("published", platform::BILIBILI, LogLevel::Success);

        let contents = std::fs::read_to_string(path).expect("read");
        assert!(contents.contains("[success] [bilibili] published"));
    }

    #[test]
    fn concurrent_producers_and_readers() {
        let engine = shared_engine(LogStoreConfig::default(), SettingsStore::in_memory());
        let mut handles = Vec::new();

        for (i, name) in platform::KNOWN.iter().enumerate() {
            let engine = Arc::clone(&engine);
            handles.push(std::thread::spawn(move || {
                for n in 0..20 {
                    engine.emit(format!("worker {i} event {n}"), *name, LogLevel::Info);
                    let _ = engine.query(&LogQuery::new().with_platform(*name));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker thread");
        }

        assert_eq!(engine.len(), 120);
        assert_eq!(engine.platforms().len(), platform::KNOWN.len());
    }
}
