//! Bounded in-memory log storage.
//!
//! This module provides:
//! - [`LogStore`] — Thread-safe, capacity-bounded log storage with FIFO
//!   eviction, merge-on-append deduplication, and a derived platform index
//! - [`LogStream`] — Async stream for tailing appended and merged records
//!
//! All mutation (append, tail merge, evict, clear) happens under one
//! write lock, so readers see snapshot-consistent state and never observe
//! a half-applied merge.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::dedup::{Admission, Deduplicator};
use crate::types::{LogQuery, LogRecord};

/// Configuration for the log store.
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    /// Maximum number of records to keep; oldest are evicted first.
    pub max_records: usize,
    /// Channel capacity for tail streaming.
    pub stream_buffer_size: usize,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            max_records: 500,
            stream_buffer_size: 1024,
        }
    }
}

/// State guarded by the store's single lock.
///
/// The platform map holds reference counts so eviction can maintain the
/// index without rescanning; it is derived from `records`, never mutated
/// independently. Unscoped records (empty platform) are not indexed.
struct StoreInner {
    records: VecDeque<LogRecord>,
    platforms: HashMap<String, usize>,
    dedup: Deduplicator,
}

impl StoreInner {
    /// Appends a record and evicts from the front down to `max_records`.
    fn push(&mut self, record: LogRecord, max_records: usize) {
        if !record.platform.is_empty() {
            *self.platforms.entry(record.platform.clone()).or_insert(0) += 1;
        }
        self.records.push_back(record);

        while self.records.len() > max_records {
            if let Some(evicted) = self.records.pop_front() {
                self.unindex(&evicted);
            }
        }
    }

    fn unindex(&mut self, record: &LogRecord) {
        if record.platform.is_empty() {
            return;
        }
        if let Some(count) = self.platforms.get_mut(&record.platform) {
            *count -= 1;
            if *count == 0 {
                self.platforms.remove(&record.platform);
            }
        }
    }
}

/// Thread-safe, capacity-bounded log store with merge-on-append
/// deduplication.
pub struct LogStore {
    config: LogStoreConfig,
    inner: RwLock<StoreInner>,
    broadcast: broadcast::Sender<LogRecord>,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::with_config(LogStoreConfig::default())
    }
}

impl LogStore {
    /// Creates a store holding at most `max_records` records.
    #[must_use]
    pub fn new(max_records: usize) -> Self {
        Self::with_config(LogStoreConfig {
            max_records,
            ..Default::default()
        })
    }

    /// Creates a store with full configuration.
    #[must_use]
    pub fn with_config(config: LogStoreConfig) -> Self {
        let (broadcast, _) = broadcast::channel(config.stream_buffer_size);

        Self {
            config,
            inner: RwLock::new(StoreInner {
                records: VecDeque::new(),
                platforms: HashMap::new(),
                dedup: Deduplicator::new(),
            }),
            broadcast,
        }
    }

    /// Appends an event under the given deduplication policy.
    ///
    /// Equivalent consecutive events merge into the open tail record
    /// (count incremented, stored timestamp unchanged) when
    /// `dedup_enabled` is true; everything else appends, silently
    /// evicting the oldest records past capacity. Never fails.
    pub fn append(&self, record: LogRecord, dedup_enabled: bool) {
        let visible = {
            let mut inner = self.inner.write();
            match inner.dedup.admit(&record, dedup_enabled) {
                Admission::MergeIntoTail => match inner.records.back_mut() {
                    Some(tail) => {
                        tail.repeat_count = tail.repeat_count.saturating_add(1);
                        tail.clone()
                    }
                    // An open tail over an empty store cannot happen
                    // (clear closes the tail under this same lock);
                    // degrade to a plain append.
                    None => {
                        let visible = record.clone();
                        inner.push(record, self.config.max_records);
                        visible
                    }
                },
                Admission::Append => {
                    let visible = record.clone();
                    inner.push(record, self.config.max_records);
                    visible
                }
            }
        };

        // Ignore errors if no tail subscribers.
        let _ = self.broadcast.send(visible);
    }

    /// Queries records matching the filter, newest first.
    ///
    /// The limit is applied after filtering; insertion order is
    /// chronological, so reverse insertion order is the stable
    /// reverse-chronological order. Returns an empty vec, never an error.
    #[must_use]
    pub fn query(&self, query: &LogQuery) -> Vec<LogRecord> {
        let limit = query.effective_limit();
        let inner = self.inner.read();

        inner
            .records
            .iter()
            .rev()
            .filter(|r| r.matches(query))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Distinct platforms with at least one stored record, sorted.
    ///
    /// Unscoped records do not contribute a platform. Reflects evictions
    /// and clears exactly.
    #[must_use]
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.inner.read().platforms.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// Creates a stream yielding records matching the filter as they are
    /// appended or merged (merged tails arrive with their updated count).
    #[must_use]
    pub fn tail(&self, query: LogQuery) -> LogStream {
        LogStream::new(self.broadcast.subscribe(), query)
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Removes all records, empties the platform index, and closes the
    /// deduplication tail.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.records.clear();
        inner.platforms.clear();
        inner.dedup.reset();
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LogStoreConfig {
        &self.config
    }
}

/// Async stream of appended and merged log records.
pub struct LogStream {
    receiver: broadcast::Receiver<LogRecord>,
    query: LogQuery,
    closed: bool,
}

impl LogStream {
    const fn new(receiver: broadcast::Receiver<LogRecord>, query: LogQuery) -> Self {
        Self {
            receiver,
            query,
            closed: false,
        }
    }

    /// Closes the stream.
    pub const fn close(&mut self) {
        self.closed = true;
    }

    /// Returns true if the stream is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Receives the next matching record asynchronously.
    async fn recv_next(&mut self) -> Option<LogRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => {
                    if record.matches(&self.query) {
                        return Some(record);
                    }
                    // Record didn't match the filter, try the next one.
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Slow consumer dropped some records; keep receiving.
                }
            }
        }
    }
}

impl Stream for LogStream {
    type Item = LogRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.closed {
            return Poll::Ready(None);
        }

        let future = self.recv_next();
        tokio::pin!(future);

        future.poll(cx)
    }
}

/// Shared log store handle.
pub type SharedLogStore = Arc<LogStore>;
