//! Append-only text file mirror for emitted events.
//!
//! Every event the engine accepts can also be appended to a dated
//! `app_YYYYMMDD.log` file for offline inspection. The sink reports
//! failures as errors; the engine swallows them, because logging must
//! never fail its caller. Record persistence is a convenience here, not
//! a durability guarantee.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::types::LogRecord;

/// Append-only sink writing one formatted line per event.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens (creating as needed) today's log file under `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("app_{}.log", Utc::now().format("%Y%m%d")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Appends one formatted line for the record.
    pub fn write(&self, record: &LogRecord) -> Result<()> {
        let line = Self::format_line(record);
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Returns the path of the file being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_line(record: &LogRecord) -> String {
        let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S");
        if record.platform.is_empty() {
            format!("[{timestamp}] [{}] {}\n", record.level, record.message)
        } else {
            format!(
                "[{timestamp}] [{}] [{}] {}\n",
                record.level, record.platform, record.message
            )
        }
    }
}
