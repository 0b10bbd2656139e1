// SPDX-License-Identifier: GPL-3.0-only
//! Bus-to-connector mapping
//!
//! The I2C bus scan and the DRM connector list are two unordered views of
//! the same monitors with no shared identifier. They are joined on the EDID
//! identity key, and every match is written to the cache under the
//! connector's name.

use std::path::PathBuf;

use crate::cache::{CacheRecord, CacheStore};
use crate::config::Config;
use crate::protocols::BusOpener;

use super::connector::{ConnectorCandidate, connected_connectors};
use super::edid::IdentityBlock;
use super::probe::probe_bus;

/// Where and how far to look for monitors
#[derive(Debug, Clone)]
pub struct Discovery {
    pub drm_root: PathBuf,
    pub i2c_device_prefix: String,
    pub max_buses: u32,
    pub max_connectors: usize,
    /// Cache a negative result for connectors no bus device matched
    pub remember_unmatched: bool,
}

impl Discovery {
    pub fn from_config(config: &Config) -> Self {
        Self {
            drm_root: config.drm_root.clone(),
            i2c_device_prefix: config.i2c_device_prefix.clone(),
            max_buses: config.max_buses,
            max_connectors: config.max_connectors,
            remember_unmatched: config.remember_unmatched,
        }
    }

    /// `/dev/i2c-` + `index`
    pub fn bus_path(&self, index: u32) -> PathBuf {
        PathBuf::from(format!("{}{}", self.i2c_device_prefix, index))
    }
}

/// Outcome of one full scan
#[derive(Debug, Default)]
pub struct MapReport {
    /// Records written for matched connectors
    pub matched: Vec<CacheRecord>,
    /// Connected connectors that no bus device matched
    pub unmatched: Vec<String>,
}

impl MapReport {
    pub fn found_any(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// First connector whose identity key equals `identity`'s
pub fn match_connector<'a>(
    identity: &IdentityBlock,
    connectors: &'a [ConnectorCandidate],
) -> Option<&'a ConnectorCandidate> {
    connectors.iter().find(|c| c.identity.matches(identity))
}

/// Probe every bus, match against connected connectors and refresh the cache
pub fn map_all_monitors<O: BusOpener>(
    discovery: &Discovery,
    opener: &O,
    store: &CacheStore,
) -> MapReport {
    let connectors = connected_connectors(&discovery.drm_root, discovery.max_connectors);
    info!(
        "Scanning {} I2C bus(es) against {} connected connector(s)",
        discovery.max_buses,
        connectors.len()
    );

    let mut report = MapReport::default();
    let mut matched_names: Vec<&str> = Vec::new();

    for index in 0..discovery.max_buses {
        let path = discovery.bus_path(index);
        let Some(candidate) = probe_bus(opener, index, &path) else {
            continue;
        };

        let Some(connector) = match_connector(&candidate.identity, &connectors) else {
            debug!(device = %path.display(), "DDC/CI device matches no connected connector");
            continue;
        };

        let record = CacheRecord::supported(&connector.name, &candidate.path, candidate.brightness);
        info!(
            bus = candidate.index,
            "Matched {} to {} (brightness {})",
            connector.name,
            path.display(),
            candidate.brightness
        );
        if let Err(e) = store.write(&record) {
            warn!("Failed to cache {}: {}", connector.name, e);
        }
        matched_names.push(&connector.name);
        report.matched.push(record);
    }

    for connector in &connectors {
        if matched_names.contains(&connector.name.as_str()) {
            continue;
        }
        debug!(connector = %connector.name, "No DDC/CI device matched");
        report.unmatched.push(connector.name.clone());

        // A valid record from an earlier scan is kept over a negative one.
        if discovery.remember_unmatched && store.read(&connector.name).is_none() {
            if let Err(e) = store.write(&CacheRecord::unsupported(&connector.name)) {
                warn!("Failed to cache {}: {}", connector.name, e);
            }
        }
    }

    if !report.unmatched.is_empty() {
        info!("No DDC/CI device for: {}", report.unmatched.join(", "));
    }
    info!("Found {} DDC/CI monitor(s)", report.matched.len());
    report
}
