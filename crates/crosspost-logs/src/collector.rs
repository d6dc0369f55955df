//! Log collection from platform upload workers.
//!
//! This module provides:
//! - [`LineParser`] — Level detection for raw worker output lines
//! - [`PlatformCollector`] — A per-platform producer handle
//!
//! Upload workers print free-form lines (`[error] cookie expired`,
//! `WARN: rate limited`, occasionally structured JSON). The parser maps
//! them onto a level and a clean message before they enter the engine.

use std::sync::Arc;

use crate::engine::LogEngine;
use crate::types::LogLevel;

/// Parser for raw log lines.
pub struct LineParser {
    /// Level assigned to lines with no recognizable prefix.
    default_level: LogLevel,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    /// Creates a parser defaulting unrecognized lines to info.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_level: LogLevel::Info,
        }
    }

    /// Creates a parser with a custom default level.
    #[must_use]
    pub const fn with_default_level(level: LogLevel) -> Self {
        Self {
            default_level: level,
        }
    }

    /// Parses one line into a level and the remaining message.
    #[must_use]
    pub fn parse(&self, line: &str) -> (LogLevel, String) {
        let trimmed = line.trim();

        if trimmed.starts_with('{') {
            if let Some(parsed) = self.parse_json(trimmed) {
                return parsed;
            }
        }

        self.parse_plain(trimmed)
    }

    /// Parses a structured JSON line with level/message fields.
    fn parse_json(&self, line: &str) -> Option<(LogLevel, String)> {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        let obj = value.as_object()?;

        let message = ["msg", "message", "text"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))?
            .to_string();

        let level = ["level", "lvl", "severity"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
            .and_then(|s| s.to_lowercase().parse::<LogLevel>().ok())
            .unwrap_or(self.default_level);

        Some((level, message))
    }

    /// Parses a plain text line, detecting a level prefix.
    fn parse_plain(&self, line: &str) -> (LogLevel, String) {
        let upper = line.to_uppercase();

        let prefixes = [
            ("ERROR", LogLevel::Error),
            ("ERR", LogLevel::Error),
            ("WARNING", LogLevel::Warn),
            ("WARN", LogLevel::Warn),
            ("SUCCESS", LogLevel::Success),
            ("INFO", LogLevel::Info),
            ("DEBUG", LogLevel::Debug),
            ("DBG", LogLevel::Debug),
        ];

        for (prefix, level) in prefixes {
            if upper.starts_with(prefix) {
                let rest = &line[prefix.len()..];
                if rest.starts_with(':')
                    || rest.starts_with(' ')
                    || rest.starts_with(']')
                    || rest.starts_with('|')
                {
                    let message = rest.trim_start_matches([':', ' ', '|']);
                    return (level, message.to_string());
                }
            }
            // Bracketed form like [error].
            let bracketed = format!("[{prefix}]");
            if upper.starts_with(&bracketed) {
                let message = line[bracketed.len()..].trim();
                return (level, message.to_string());
            }
        }

        (self.default_level, line.to_string())
    }
}

/// A producer handle bound to one platform.
///
/// Upload workers hold one of these instead of the engine itself, so
/// every event they emit is scoped to their platform.
pub struct PlatformCollector {
    platform: String,
    engine: Arc<LogEngine>,
    parser: LineParser,
}

impl PlatformCollector {
    /// Creates a collector for the given platform.
    #[must_use]
    pub fn new(platform: impl Into<String>, engine: Arc<LogEngine>) -> Self {
        Self {
            platform: platform.into(),
            engine,
            parser: LineParser::new(),
        }
    }

    /// Creates a collector with a custom parser.
    #[must_use]
    pub fn with_parser(
        platform: impl Into<String>,
        engine: Arc<LogEngine>,
        parser: LineParser,
    ) -> Self {
        Self {
            platform: platform.into(),
            engine,
            parser,
        }
    }

    /// Returns the platform this collector is bound to.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Parses one raw output line and emits it.
    pub fn collect_line(&self, line: &str) {
        let (level, message) = self.parser.parse(line);
        self.engine.emit(message, self.platform.clone(), level);
    }

    /// Parses and emits every non-empty line.
    pub fn collect_lines(&self, lines: &str) {
        for line in lines.lines() {
            if !line.trim().is_empty() {
                self.collect_line(line);
            }
        }
    }

    /// Emits a debug event for this platform.
    pub fn debug(&self, message: impl Into<String>) {
        self.engine
            .emit(message, self.platform.clone(), LogLevel::Debug);
    }

    /// Emits an info event for this platform.
    pub fn info(&self, message: impl Into<String>) {
        self.engine
            .emit(message, self.platform.clone(), LogLevel::Info);
    }

    /// Emits a success event for this platform.
    pub fn success(&self, message: impl Into<String>) {
        self.engine
            .emit(message, self.platform.clone(), LogLevel::Success);
    }

    /// Emits a warning event for this platform.
    pub fn warn(&self, message: impl Into<String>) {
        self.engine
            .emit(message, self.platform.clone(), LogLevel::Warn);
    }

    /// Emits an error event for this platform.
    pub fn error(&self, message: impl Into<String>) {
        self.engine
            .emit(message, self.platform.clone(), LogLevel::Error);
    }
}
