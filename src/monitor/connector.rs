// SPDX-License-Identifier: GPL-3.0-only
//! DRM connector enumeration
//!
//! Connectors show up as `cardN-<NAME>` directories under the DRM class
//! directory, each with a `status` file and an `edid` file.

use std::fs;
use std::path::Path;

use super::edid::IdentityBlock;

const CARD_PREFIX: &str = "card";
const SEPARATOR: char = '-';
const CONNECTED: &str = "connected";

/// A connected connector whose EDID could be read
#[derive(Debug, Clone)]
pub struct ConnectorCandidate {
    /// Connector name as the compositor reports it, e.g. `DP-1`
    pub name: String,
    pub identity: IdentityBlock,
}

/// `card0-DP-1` -> `DP-1`
pub fn connector_name(entry: &str) -> Option<&str> {
    if !entry.starts_with(CARD_PREFIX) {
        return None;
    }
    entry
        .split_once(SEPARATOR)
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

/// List connected connectors with a readable EDID, at most `limit` of them
pub fn connected_connectors(drm_root: &Path, limit: usize) -> Vec<ConnectorCandidate> {
    let entries = match fs::read_dir(drm_root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read {}: {}", drm_root.display(), e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| connector_name(name).is_some())
        .collect();
    names.sort();

    let mut connectors = Vec::new();
    for entry in names {
        if connectors.len() >= limit {
            debug!("Connector limit of {} reached, ignoring the rest", limit);
            break;
        }

        let dir = drm_root.join(&entry);
        let status = match fs::read_to_string(dir.join("status")) {
            Ok(status) => status,
            Err(_) => continue,
        };
        if !status.starts_with(CONNECTED) {
            continue;
        }

        let Some(name) = connector_name(&entry) else {
            continue;
        };
        match IdentityBlock::read_from_file(&dir.join("edid")) {
            Ok(identity) => {
                debug!(connector = %name, ?identity, "Found connected connector");
                connectors.push(ConnectorCandidate {
                    name: name.to_string(),
                    identity,
                });
            }
            Err(e) => {
                debug!(connector = %name, "Connected but no usable EDID: {}", e);
            }
        }
    }

    connectors
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocols::fake::edid;

    /// Create `cardN-<name>` with the given status and optional EDID
    pub(crate) fn add_connector(root: &Path, entry: &str, status: &str, edid: Option<&[u8]>) {
        let dir = root.join(entry);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("status"), status).unwrap();
        if let Some(edid) = edid {
            fs::write(dir.join("edid"), edid).unwrap();
        }
    }

    #[test]
    fn test_connector_name() {
        assert_eq!(connector_name("card0-DP-1"), Some("DP-1"));
        assert_eq!(connector_name("card1-HDMI-A-2"), Some("HDMI-A-2"));
        assert_eq!(connector_name("card0"), None);
        assert_eq!(connector_name("renderD128"), None);
        assert_eq!(connector_name("version"), None);
        assert_eq!(connector_name("card0-"), None);
    }

    #[test]
    fn test_only_connected_with_edid() {
        let root = tempfile::tempdir().unwrap();
        add_connector(root.path(), "card0-DP-1", "connected\n", Some(&edid(1)));
        add_connector(root.path(), "card0-DP-2", "disconnected\n", Some(&edid(2)));
        add_connector(root.path(), "card0-HDMI-A-1", "connected\n", None);
        add_connector(root.path(), "card0-eDP-1", "connected\n", Some(b""));
        fs::create_dir_all(root.path().join("card0")).unwrap();
        fs::create_dir_all(root.path().join("renderD128")).unwrap();

        let connectors = connected_connectors(root.path(), 10);
        let names: Vec<_> = connectors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["DP-1"]);
        assert_eq!(connectors[0].identity.as_bytes(), &edid(1)[..]);
    }

    #[test]
    fn test_connector_limit() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..5u8 {
            add_connector(
                root.path(),
                &format!("card0-DP-{i}"),
                "connected\n",
                Some(&edid(i)),
            );
        }

        assert_eq!(connected_connectors(root.path(), 3).len(), 3);
        assert_eq!(connected_connectors(root.path(), 10).len(), 5);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(connected_connectors(&root.path().join("nope"), 10).is_empty());
    }
}
