// SPDX-License-Identifier: GPL-3.0-only
//! Per-invocation cache coordination
//!
//! There is no daemon: concurrent invocations for the same monitor are
//! serialized by a non-blocking `flock` on that monitor's cache file, held
//! from cache lookup through the hardware write. A second invocation that
//! finds the lock taken gives up immediately with
//! [`AppError::LockContention`].
//!
//! Each run walks `Locking -> Resolving -> Applying -> Releasing`. The lock
//! is a [`CacheLock`] guard, so `Releasing` happens on every exit path.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use crate::brightness::{BrightnessController, BrightnessRequest};
use crate::error::{AppError, Result};
use crate::monitor::{Discovery, map_all_monitors};
use crate::protocols::BusOpener;
use crate::protocols::ddc_ci::DdcCiDisplay;

use super::store::{CACHE_FILE_MODE, CacheRecord, CacheStore};

/// Reopen attempts when the lock file is swapped out underneath us
const LOCK_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Locking,
    Resolving,
    Applying,
    Releasing,
}

/// Exclusive advisory lock on one cache file, released on drop
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
    created: bool,
}

impl CacheLock {
    /// Open (creating if needed) and lock `path` without waiting
    pub fn acquire(path: &Path, monitor: &str) -> Result<Self> {
        for _ in 0..LOCK_ATTEMPTS {
            let (file, created) = open_or_create(path).map_err(|e| AppError::cache(path, e))?;
            if let Some(lock) = Self::try_lock(file, created, path, monitor)? {
                return Ok(lock);
            }
            debug!("{} was replaced while locking, retrying", path.display());
        }
        Err(AppError::LockContention {
            monitor: monitor.to_string(),
        })
    }

    /// Lock an already opened `file`.
    ///
    /// Returns `None` when `path` no longer names the locked inode: a previous
    /// holder removed it before releasing, so the lock guards nothing.
    fn try_lock(file: File, created: bool, path: &Path, monitor: &str) -> Result<Option<Self>> {
        // SAFETY: the fd belongs to `file`, which outlives the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(AppError::LockContention {
                    monitor: monitor.to_string(),
                });
            }
            return Err(AppError::cache(path, err));
        }

        let lock = Self {
            file,
            path: path.to_path_buf(),
            created,
        };
        if !lock.is_current().map_err(|e| AppError::cache(path, e))? {
            return Ok(None);
        }
        Ok(Some(lock))
    }

    /// Whether the locked file is still the one at `path`
    fn is_current(&self) -> io::Result<bool> {
        let held = self.file.metadata()?;
        match std::fs::metadata(&self.path) {
            Ok(on_disk) => Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove the file again if this lock created it and nothing was written
    fn discard_if_unused(&self) {
        if !self.created {
            return;
        }
        match self.file.metadata() {
            Ok(meta) if meta.len() == 0 => {
                if let Err(e) = std::fs::remove_file(&self.path) {
                    debug!("Failed to remove {}: {}", self.path.display(), e);
                }
            }
            _ => {}
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        // SAFETY: the fd is still owned by `self.file`.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

fn open_or_create(path: &Path) -> io::Result<(File, bool)> {
    let created = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(CACHE_FILE_MODE)
        .open(path);
    match created {
        Ok(file) => Ok((file, true)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            Ok((file, false))
        }
        Err(e) => Err(e),
    }
}

/// Runs one brightness change against the cache and the hardware
pub struct Coordinator<'a, O> {
    store: &'a CacheStore,
    discovery: &'a Discovery,
    opener: &'a O,
}

impl<'a, O: BusOpener> Coordinator<'a, O> {
    pub fn new(store: &'a CacheStore, discovery: &'a Discovery, opener: &'a O) -> Self {
        Self {
            store,
            discovery,
            opener,
        }
    }

    /// Change `monitor`'s brightness; returns the value written
    pub fn run(&self, monitor: &str, request: &BrightnessRequest) -> Result<u8> {
        trace_phase(Phase::Locking, monitor);
        let lock = CacheLock::acquire(&self.store.path_for(monitor), monitor)?;

        let result = self.locked(&lock, monitor, request);

        trace_phase(Phase::Releasing, monitor);
        drop(lock);
        result
    }

    fn locked(&self, lock: &CacheLock, monitor: &str, request: &BrightnessRequest) -> Result<u8> {
        trace_phase(Phase::Resolving, monitor);
        let mut record = match self.resolve(monitor) {
            Ok(record) => record,
            Err(e) => {
                lock.discard_if_unused();
                return Err(e);
            }
        };

        trace_phase(Phase::Applying, monitor);
        let current = record.brightness;
        let target = request.adjustment.target(current);

        // Optimistic: the cache holds the intended value even if the
        // hardware write below fails part way.
        record.brightness = target;
        self.store
            .write(&record)
            .map_err(|e| AppError::cache(self.store.path_for(monitor), e))?;

        let device = record.bus_path.as_str();
        let bus = self
            .opener
            .open(Path::new(device))
            .map_err(|e| AppError::hardware(device, e))?;
        let mut display = DdcCiDisplay::attach(bus).map_err(|e| AppError::hardware(device, e))?;

        BrightnessController::new(request.strategy)
            .apply(&mut display, current, target)
            .map_err(|e| AppError::hardware(device, e))?;

        info!(monitor, device, from = current, to = target, "Brightness changed");
        Ok(target)
    }

    fn resolve(&self, monitor: &str) -> Result<CacheRecord> {
        if let Some(record) = self.store.read(monitor) {
            if record.unsupported {
                return Err(AppError::UnsupportedMonitor {
                    monitor: monitor.to_string(),
                });
            }
            debug!(monitor, device = %record.bus_path, "Cache hit");
            return Ok(record);
        }

        info!("No usable cache for {}, scanning for monitors", monitor);
        let report = map_all_monitors(self.discovery, self.opener, self.store);
        if !report.found_any() {
            return Err(AppError::Discovery {
                monitor: monitor.to_string(),
            });
        }

        match self.store.read(monitor) {
            Some(record) if record.unsupported => Err(AppError::UnsupportedMonitor {
                monitor: monitor.to_string(),
            }),
            Some(record) => Ok(record),
            None => Err(AppError::Discovery {
                monitor: monitor.to_string(),
            }),
        }
    }
}

fn trace_phase(phase: Phase, monitor: &str) {
    debug!(monitor, ?phase, "Cache coordinator");
}
