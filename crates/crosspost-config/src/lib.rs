//! Persisted application settings for Crosspost.
//!
//! Provides [`SettingsStore`], a small JSON-snapshot-backed store for the
//! handful of switches that must survive restarts. Reads never fail the
//! caller: a missing or unreadable snapshot falls back to
//! [`Settings::default`], and failed snapshots on write are logged and
//! swallowed.

#![forbid(unsafe_code)]

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File name of the settings snapshot inside the state directory.
const SETTINGS_FILE: &str = "settings.json";

/// Errors raised by the persistence layer. These never escape
/// [`SettingsStore`]'s public API; they exist so the two-stage
/// read-or-default path is explicit and testable.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Snapshot file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot contents were not valid settings JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Application settings that survive restarts.
///
/// Unknown fields in an on-disk snapshot are ignored and missing fields
/// take their defaults, so old snapshots stay loadable across upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Whether repeated consecutive log events are merged into one record.
    pub dedup_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dedup_enabled: true,
        }
    }
}

/// Settings store backed by a JSON snapshot file.
///
/// All reads are served from an in-memory cache; the snapshot is only
/// touched at construction and on writes.
pub struct SettingsStore {
    path: Option<PathBuf>,
    cached: RwLock<Settings>,
}

impl SettingsStore {
    /// Creates a store rooted at `state_dir`, loading any existing
    /// snapshot. Any read failure yields [`Settings::default`].
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let path = state_dir.as_ref().join(SETTINGS_FILE);
        let cached = match Self::read_snapshot(&path) {
            Ok(settings) => {
                debug!(path = %path.display(), "loaded settings snapshot");
                settings
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no usable settings snapshot, using defaults");
                Settings::default()
            }
        };
        Self {
            path: Some(path),
            cached: RwLock::new(cached),
        }
    }

    /// Creates a store with no backing file. Writes update the cache only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cached: RwLock::new(Settings::default()),
        }
    }

    /// Returns whether log deduplication is enabled. Pure cached read.
    #[must_use]
    pub fn dedup_enabled(&self) -> bool {
        self.cached.read().dedup_enabled
    }

    /// Sets the deduplication switch and snapshots to disk. A failed
    /// snapshot is logged and swallowed; the in-memory value still took
    /// effect.
    pub fn set_dedup_enabled(&self, enabled: bool) {
        self.cached.write().dedup_enabled = enabled;
        self.snapshot();
    }

    /// Returns a copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.cached.read().clone()
    }

    fn read_snapshot(path: &Path) -> Result<Settings, SettingsError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn snapshot(&self) {
        let Some(path) = &self.path else { return };
        if let Err(e) = self.write_snapshot(path) {
            warn!(path = %path.display(), error = %e, "failed to snapshot settings");
        }
    }

    fn write_snapshot(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&*self.cached.read())?;
        fs::write(path, json)?;
        Ok(())
    }
}
