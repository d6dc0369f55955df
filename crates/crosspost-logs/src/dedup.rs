//! Consecutive-run deduplication.
//!
//! This module provides:
//! - [`RunKey`] — The identity under which two events count as repeats
//! - [`Admission`] — The store action decided for a candidate event
//! - [`Deduplicator`] — The open/closed tail state machine
//!
//! Deduplication is consecutive-only: a run is broken by any
//! non-equivalent event, and a later recurrence of the same message
//! starts a fresh record rather than rejoining an earlier run.

use crate::types::{LogLevel, LogRecord};

/// The identity of a run of equivalent events.
///
/// Two events are repeats iff message, platform, and level are all equal.
/// Timestamps never participate in equivalence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunKey {
    message: String,
    platform: String,
    level: LogLevel,
}

impl RunKey {
    /// The run identity of a record.
    #[must_use]
    pub fn of(record: &LogRecord) -> Self {
        Self {
            message: record.message.clone(),
            platform: record.platform.clone(),
            level: record.level,
        }
    }
}

/// What the store should do with a candidate event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Append the candidate as a new record with `repeat_count = 1`.
    Append,
    /// Increment the tail record's repeat count; keep its timestamp.
    MergeIntoTail,
}

/// The store tail is either open, still absorbing repeats of one run,
/// or closed for good.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TailState {
    Closed,
    Open(RunKey),
}

/// Decides, per candidate event, whether it extends the store's tail
/// record or starts a new one.
///
/// Owned by the store and driven under the store's write lock, so
/// admission and the resulting mutation are a single atomic step.
#[derive(Debug)]
pub struct Deduplicator {
    tail: TailState,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    /// Creates a deduplicator with a closed tail.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tail: TailState::Closed,
        }
    }

    /// Admits one candidate event under the current policy.
    ///
    /// With merging disabled the tail closes permanently: records
    /// emitted while merging is off never become merge targets, even if
    /// merging is re-enabled later.
    pub fn admit(&mut self, candidate: &LogRecord, enabled: bool) -> Admission {
        if !enabled {
            self.tail = TailState::Closed;
            return Admission::Append;
        }

        let key = RunKey::of(candidate);
        if matches!(&self.tail, TailState::Open(open) if *open == key) {
            return Admission::MergeIntoTail;
        }

        self.tail = TailState::Open(key);
        Admission::Append
    }

    /// Closes the tail. Called when the store is cleared.
    pub fn reset(&mut self) {
        self.tail = TailState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(message: &str, platform: &str, level: LogLevel) -> LogRecord {
        LogRecord::new(message, platform, level, Utc::now())
    }

    #[test]
    fn repeats_merge_into_open_tail() {
        let mut dedup = Deduplicator::new();
        let e = event("retrying", "douyin", LogLevel::Warn);

        assert_eq!(dedup.admit(&e, true), Admission::Append);
        assert_eq!(dedup.admit(&e, true), Admission::MergeIntoTail);
        assert_eq!(dedup.admit(&e, true), Admission::MergeIntoTail);
    }

    #[test]
    fn any_non_equivalent_event_breaks_the_run() {
        let mut dedup = Deduplicator::new();
        let a = event("retrying", "douyin", LogLevel::Warn);
        let b = event("uploaded", "douyin", LogLevel::Success);

        assert_eq!(dedup.admit(&a, true), Admission::Append);
        assert_eq!(dedup.admit(&b, true), Admission::Append);
        // Same message again, but the run is broken: fresh record.
        assert_eq!(dedup.admit(&a, true), Admission::Append);
    }

    #[test]
    fn equivalence_covers_platform_and_level() {
        let mut dedup = Deduplicator::new();
        let base = event("retrying", "douyin", LogLevel::Warn);

        assert_eq!(dedup.admit(&base, true), Admission::Append);
        assert_eq!(
            dedup.admit(&event("retrying", "tiktok", LogLevel::Warn), true),
            Admission::Append
        );
        assert_eq!(
            dedup.admit(&event("retrying", "tiktok", LogLevel::Error), true),
            Admission::Append
        );
    }

    #[test]
    fn timestamps_do_not_participate_in_equivalence() {
        let mut dedup = Deduplicator::new();
        let first = event("tick", "", LogLevel::Debug);
        let later = LogRecord::new(
            "tick",
            "",
            LogLevel::Debug,
            first.timestamp + chrono::Duration::hours(3),
        );

        assert_eq!(dedup.admit(&first, true), Admission::Append);
        assert_eq!(dedup.admit(&later, true), Admission::MergeIntoTail);
    }

    #[test]
    fn disabled_policy_always_appends() {
        let mut dedup = Deduplicator::new();
        let e = event("retrying", "", LogLevel::Warn);

        assert_eq!(dedup.admit(&e, false), Admission::Append);
        assert_eq!(dedup.admit(&e, false), Admission::Append);
        assert_eq!(dedup.admit(&e, false), Admission::Append);
    }

    #[test]
    fn re_enabling_never_merges_into_a_disabled_tail() {
        let mut dedup = Deduplicator::new();
        let e = event("retrying", "", LogLevel::Warn);

        assert_eq!(dedup.admit(&e, false), Admission::Append);
        // First event after the toggle starts its own run.
        assert_eq!(dedup.admit(&e, true), Admission::Append);
        assert_eq!(dedup.admit(&e, true), Admission::MergeIntoTail);
    }

    #[test]
    fn reset_closes_the_tail() {
        let mut dedup = Deduplicator::new();
        let e = event("retrying", "", LogLevel::Warn);

        assert_eq!(dedup.admit(&e, true), Admission::Append);
        dedup.reset();
        assert_eq!(dedup.admit(&e, true), Admission::Append);
    }
}
