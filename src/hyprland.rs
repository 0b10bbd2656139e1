// SPDX-License-Identifier: GPL-3.0-only
//! Active monitor lookup through Hyprland's IPC socket
//!
//! Hyprland answers one request per connection on
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`; the
//! `j/activeworkspace` request returns a JSON object whose `monitor` field
//! names the connector of the focused output.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const SIGNATURE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";
const SOCKET_NAME: &str = ".socket.sock";
const ACTIVE_WORKSPACE_REQUEST: &[u8] = b"j/activeworkspace";
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ActiveWorkspace {
    monitor: String,
}

/// Path of the request socket for the running Hyprland instance
pub fn socket_path() -> Result<PathBuf> {
    let signature =
        std::env::var(SIGNATURE_ENV).with_context(|| format!("{SIGNATURE_ENV} is missing"))?;
    let runtime_dir = dirs::runtime_dir().context("XDG_RUNTIME_DIR is missing")?;
    Ok(runtime_dir.join("hypr").join(signature).join(SOCKET_NAME))
}

/// Connector name of the monitor showing the active workspace
pub fn active_monitor() -> Result<String> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .with_context(|| format!("Connection to {} failed", path.display()))?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;

    stream
        .write_all(ACTIVE_WORKSPACE_REQUEST)
        .context("Write to Hyprland socket failed")?;

    let mut reply = String::new();
    stream
        .read_to_string(&mut reply)
        .context("Read from Hyprland socket failed")?;
    debug!(reply = %reply.trim(), "Hyprland active workspace");

    parse_monitor_name(&reply)
}

/// Pull the `monitor` field out of an `activeworkspace` reply
pub fn parse_monitor_name(reply: &str) -> Result<String> {
    let workspace: ActiveWorkspace =
        serde_json::from_str(reply).context("Unexpected reply from Hyprland")?;
    if workspace.monitor.is_empty() {
        bail!("Hyprland reported an empty monitor name");
    }
    Ok(workspace.monitor)
}
