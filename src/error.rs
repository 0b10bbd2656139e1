// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the application
//!
//! Every hardware or filesystem failure is converted into one of these kinds
//! at the point where it happens. The process exit code is derived from the
//! kind, see [`AppError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed command line input
    #[error("Invalid arguments: {0}")]
    Argument(String),

    /// No bus device could be matched to the requested monitor
    #[error("No DDC/CI capable monitor found for {monitor}")]
    Discovery { monitor: String },

    /// The cache marks this monitor as lacking DDC/CI
    #[error("Monitor {monitor} does not support DDC control")]
    UnsupportedMonitor { monitor: String },

    /// Another invocation holds the lock for this monitor
    #[error("Brightness change already in progress for {monitor}")]
    LockContention { monitor: String },

    /// Open, ioctl, read or write failure against a bus device
    #[error("I2C communication error on {device}: {source}")]
    HardwareIo {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// The per-monitor cache file could not be opened, locked or written
    #[error("Cache error on {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compositor could not tell us which monitor is active
    #[error("Failed to get active monitor name: {source}")]
    ActiveMonitor {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Process exit code for this failure.
    ///
    /// Lock contention gets its own code so callers (key bindings, scripts)
    /// can tell "busy" apart from a real failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::LockContention { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn hardware(device: impl Into<String>, source: std::io::Error) -> Self {
        AppError::HardwareIo {
            device: device.into(),
            source,
        }
    }

    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Cache {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;
