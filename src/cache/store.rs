// SPDX-License-Identifier: GPL-3.0-only
//! Per-monitor brightness cache files
//!
//! One file per monitor, `<cache_dir>/<monitor>.cache`, holding a single
//! line: `<name> <bus-path> <brightness> <unsupported:0|1>`. Anything that
//! does not parse as exactly that is treated as no cache at all.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::protocols::ddc_ci::MAX_BRIGHTNESS;

const CACHE_EXTENSION: &str = "cache";
const NO_DEVICE: &str = "none";

/// Mode for newly created cache files
pub const CACHE_FILE_MODE: u32 = 0o644;

/// Last known state of one monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub monitor: String,
    pub bus_path: String,
    pub brightness: u8,
    pub unsupported: bool,
}

impl CacheRecord {
    pub fn supported(monitor: &str, bus_path: &Path, brightness: u8) -> Self {
        Self {
            monitor: monitor.to_string(),
            bus_path: bus_path.display().to_string(),
            brightness: brightness.min(MAX_BRIGHTNESS),
            unsupported: false,
        }
    }

    /// Negative entry for a monitor no bus device answered for
    pub fn unsupported(monitor: &str) -> Self {
        Self {
            monitor: monitor.to_string(),
            bus_path: NO_DEVICE.to_string(),
            brightness: 0,
            unsupported: true,
        }
    }

    /// Parse a cache line; all four fields must be present and valid
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let monitor = fields.next()?;
        let bus_path = fields.next()?;
        let brightness: u8 = fields.next()?.parse().ok()?;
        let unsupported: i64 = fields.next()?.parse().ok()?;
        if fields.next().is_some() || brightness > MAX_BRIGHTNESS {
            return None;
        }

        Some(Self {
            monitor: monitor.to_string(),
            bus_path: bus_path.to_string(),
            brightness,
            unsupported: unsupported != 0,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.monitor,
            self.bus_path,
            self.brightness,
            u8::from(self.unsupported)
        )
    }

    fn validate(&self) -> io::Result<()> {
        for (what, value) in [("monitor name", &self.monitor), ("bus path", &self.bus_path)] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{what} {value:?} cannot be stored in the cache"),
                ));
            }
        }
        if self.brightness > MAX_BRIGHTNESS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("brightness {} out of range", self.brightness),
            ));
        }
        Ok(())
    }
}

/// Directory of cache files
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, monitor: &str) -> PathBuf {
        self.dir.join(format!("{monitor}.{CACHE_EXTENSION}"))
    }

    /// Read the record for `monitor`.
    ///
    /// A record that names a different monitor is stale and is ignored.
    pub fn read(&self, monitor: &str) -> Option<CacheRecord> {
        let path = self.path_for(monitor);
        let content = std::fs::read_to_string(&path).ok()?;
        let record = CacheRecord::parse(&content)?;
        if record.monitor != monitor {
            debug!(
                cache = %path.display(),
                "Ignoring cache record for {} while looking up {}",
                record.monitor,
                monitor
            );
            return None;
        }
        Some(record)
    }

    /// Replace the record for `record.monitor`.
    pub fn write(&self, record: &CacheRecord) -> io::Result<()> {
        record.validate()?;
        let path = self.path_for(&record.monitor);
        // Truncate in place: the advisory lock belongs to this inode, so the
        // file must never be replaced by a rename.
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(CACHE_FILE_MODE)
            .open(&path)?;
        file.write_all(record.to_line().as_bytes())?;
        debug!(cache = %path.display(), line = %record.to_line(), "Wrote cache record");
        Ok(())
    }
}
