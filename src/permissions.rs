// SPDX-License-Identifier: GPL-3.0-only
//! I2C access diagnostics
//!
//! When no monitor can be found the usual cause is missing access to the
//! bus devices rather than missing hardware. These checks only produce
//! hints; they never change the outcome of a run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::monitor::Discovery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub devices: Vec<PathBuf>,
    pub writable: usize,
    pub in_i2c_group: bool,
}

impl AccessReport {
    /// Human readable advice for whatever is missing
    pub fn hints(&self) -> Vec<String> {
        let mut hints = Vec::new();

        if self.devices.is_empty() {
            hints.push(
                "No I2C devices found; load the i2c-dev kernel module (modprobe i2c-dev)"
                    .to_string(),
            );
            return hints;
        }

        if self.writable == 0 {
            hints.push(format!(
                "Cannot open any of the {} I2C device(s) for read/write",
                self.devices.len()
            ));
        } else if self.writable < self.devices.len() {
            debug!(
                "Can access {}/{} I2C device(s)",
                self.writable,
                self.devices.len()
            );
        }

        if !self.in_i2c_group && self.writable < self.devices.len() {
            hints.push(
                "User is not in the i2c group; add it with: sudo usermod -aG i2c $USER"
                    .to_string(),
            );
        }

        hints
    }
}

/// Inspect the bus devices discovery would probe
pub fn check_i2c_access(discovery: &Discovery) -> AccessReport {
    let devices = find_i2c_devices(discovery);
    let writable = devices.iter().filter(|d| can_write(d)).count();
    AccessReport {
        devices,
        writable,
        in_i2c_group: is_in_i2c_group(),
    }
}

/// Log hints after a failed discovery
pub fn log_access_hints(discovery: &Discovery) {
    let report = check_i2c_access(discovery);
    for hint in report.hints() {
        warn!("{}", hint);
    }
}

/// Find all I2C device files
fn find_i2c_devices(discovery: &Discovery) -> Vec<PathBuf> {
    (0..discovery.max_buses)
        .map(|index| discovery.bus_path(index))
        .filter(|path| path.exists())
        .collect()
}

/// Check if we can open a device for read and write
fn can_write(path: &Path) -> bool {
    fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .is_ok()
}

/// Check if current user is in the i2c group
fn is_in_i2c_group() -> bool {
    use std::process::Command;

    match Command::new("groups").output() {
        Ok(output) => match String::from_utf8(output.stdout) {
            Ok(groups) => {
                debug!("Groups output: '{}'", groups.trim());
                groups.split_whitespace().any(|g| g == "i2c")
            }
            Err(e) => {
                debug!("Failed to parse groups output: {}", e);
                false
            }
        },
        Err(e) => {
            debug!("Failed to run groups command: {}", e);
            false
        }
    }
}
