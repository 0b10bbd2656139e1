// SPDX-License-Identifier: GPL-3.0-only
//! User configuration
//!
//! Read from `$DDCBRIGHT_CONFIG` or `~/.config/ddcbright/config.toml`. Every
//! field is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "DDCBRIGHT_CONFIG";

pub const DEFAULT_CACHE_DIR: &str = "/tmp/hypr_brightness";
pub const DEFAULT_DRM_ROOT: &str = "/sys/class/drm";
pub const DEFAULT_I2C_PREFIX: &str = "/dev/i2c-";

/// Number of `/dev/i2c-N` nodes probed during discovery
pub const MAX_BUSES: u32 = 20;
/// Number of connected connectors considered during discovery
pub const MAX_CONNECTORS: usize = 10;

pub const DEFAULT_STEP: u8 = 2;
pub const DEFAULT_SLEEP_MS: u64 = 0;

const BUS_LIMIT: u32 = 256;
const CONNECTOR_LIMIT: usize = 64;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub drm_root: PathBuf,
    pub i2c_device_prefix: String,
    pub max_buses: u32,
    pub max_connectors: usize,
    /// Write an "unsupported" cache entry for connected monitors that no
    /// I2C bus answered for, instead of rescanning on every invocation
    pub remember_unmatched: bool,
    pub gradual: GradualConfig,
}

/// Defaults for `-a` when no step or pause is given
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GradualConfig {
    pub step: u8,
    pub sleep_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            drm_root: PathBuf::from(DEFAULT_DRM_ROOT),
            i2c_device_prefix: DEFAULT_I2C_PREFIX.to_string(),
            max_buses: MAX_BUSES,
            max_connectors: MAX_CONNECTORS,
            remember_unmatched: false,
            gradual: GradualConfig::default(),
        }
    }
}

impl Default for GradualConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            sleep_ms: DEFAULT_SLEEP_MS,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ddcbright")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config.validated())
    }

    /// Pull out-of-range limits back into something sane
    fn validated(mut self) -> Self {
        self.max_buses = self.max_buses.clamp(1, BUS_LIMIT);
        self.max_connectors = self.max_connectors.clamp(1, CONNECTOR_LIMIT);
        if !(1..=100).contains(&self.gradual.step) {
            warn!(
                "Ignoring gradual step {}, using {}",
                self.gradual.step, DEFAULT_STEP
            );
            self.gradual.step = DEFAULT_STEP;
        }
        self
    }
}
