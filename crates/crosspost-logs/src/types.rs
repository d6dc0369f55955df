//! Core types for the logging engine.
//!
//! This module provides:
//! - [`LogLevel`] — Severity levels for log records
//! - [`LogRecord`] — A stored log event, possibly a merged run of repeats
//! - [`LogQuery`] — Filter criteria for searching logs
//! - [`platform`] — Well-known publishing platform identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// Default number of records returned by a query when no limit is given.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Well-known publishing platform identifiers.
///
/// The platform field is an open string set: new platforms appear without
/// a schema migration. These constants cover the platforms the uploader
/// ships with; the empty string marks system/unscoped records.
pub mod platform {
    /// Bilibili.
    pub const BILIBILI: &str = "bilibili";
    /// Douyin.
    pub const DOUYIN: &str = "douyin";
    /// Xiaohongshu.
    pub const XIAOHONGSHU: &str = "xiaohongshu";
    /// Kuaishou.
    pub const KUAISHOU: &str = "kuaishou";
    /// TikTok.
    pub const TIKTOK: &str = "tiktok";
    /// Baijiahao.
    pub const BAIJIAHAO: &str = "baijiahao";
    /// System/unscoped records carry no platform.
    pub const SYSTEM: &str = "";

    /// The platforms the uploader ships with.
    pub const KNOWN: [&str; 6] = [BILIBILI, DOUYIN, XIAOHONGSHU, KUAISHOU, TIKTOK, BAIJIAHAO];

    /// Returns true if `value` is one of the shipped platforms.
    #[must_use]
    pub fn is_known(value: &str) -> bool {
        KNOWN.contains(&value)
    }
}

/// Log severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debugging information
    Debug = 0,
    /// General information
    Info = 1,
    /// A step completed successfully
    Success = 2,
    /// Warning conditions
    Warn = 3,
    /// Error conditions
    Error = 4,
}

impl LogLevel {
    /// Returns the lowercase string representation of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogError::UnknownLevel(other.to_string())),
        }
    }
}

/// A stored log event.
///
/// Records are immutable once appended, except for `repeat_count` while
/// the record is still the store's open tail: consecutive equivalent
/// events merge into it instead of appending. A count of 1 means no
/// merging happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// When the first occurrence of this event was emitted.
    pub timestamp: DateTime<Utc>,
    /// The log message.
    pub message: String,
    /// Platform identifier; empty for system/unscoped records.
    pub platform: String,
    /// Severity level.
    pub level: LogLevel,
    /// Number of consecutive equivalent events merged into this record.
    pub repeat_count: u32,
}

impl LogRecord {
    /// Creates a fresh, unmerged record.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        platform: impl Into<String>,
        level: LogLevel,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            message: message.into(),
            platform: platform.into(),
            level,
            repeat_count: 1,
        }
    }

    /// The record's date in the `YYYY/M/D` form the UI displays.
    #[must_use]
    pub fn date(&self) -> String {
        self.timestamp.format("%Y/%-m/%-d").to_string()
    }

    /// The record's time of day in `HH:MM:SS` form.
    #[must_use]
    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Checks whether this record matches the given query filters.
    #[must_use]
    pub fn matches(&self, query: &LogQuery) -> bool {
        if let Some(keyword) = query.keyword.as_deref() {
            if !keyword.is_empty() {
                let keyword = keyword.to_lowercase();
                if !self.message.to_lowercase().contains(&keyword) {
                    return false;
                }
            }
        }

        if let Some(platform) = query.platform.as_deref() {
            if !platform.is_empty() && self.platform != platform {
                return false;
            }
        }

        if let Some(level) = query.level.as_deref() {
            if !level.is_empty() {
                match level.parse::<LogLevel>() {
                    Ok(level) if self.level == level => {}
                    // An unknown level name selects nothing instead of
                    // failing the query.
                    _ => return false,
                }
            }
        }

        true
    }
}

/// Filter criteria for querying logs.
///
/// All fields are optional; empty strings are equivalent to absent. The
/// supplied filters combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogQuery {
    /// Case-insensitive substring match against the message.
    pub keyword: Option<String>,
    /// Exact platform match; empty/absent matches all platforms.
    pub platform: Option<String>,
    /// Exact level match by lowercase name; unknown names match nothing.
    pub level: Option<String>,
    /// Result cap; absent or 0 means [`DEFAULT_QUERY_LIMIT`].
    pub limit: Option<usize>,
}

impl LogQuery {
    /// Creates an empty query that matches all records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword filter.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Adds a platform filter.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Adds a level filter.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level.as_str().to_string());
        self
    }

    /// Adds a level filter from a raw name, valid or not.
    #[must_use]
    pub fn with_level_name(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Caps the number of returned records.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The result cap to apply, defaulting absent or zero limits.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_QUERY_LIMIT,
        }
    }
}
