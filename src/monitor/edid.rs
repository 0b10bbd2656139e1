// SPDX-License-Identifier: GPL-3.0-only
//! EDID identity blocks
//!
//! The same physical monitor exposes its EDID twice: over the I2C bus at
//! [`EDID_ADDR`] and as a sysfs file under its DRM connector. Only bytes
//! 8..18 (manufacturer, product code and serial) are stable between the two
//! read paths, so that slice is the comparison key.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::ops::Range;
use std::path::Path;

use crate::protocols::I2cBus;

/// I2C slave address of the EDID EEPROM
pub const EDID_ADDR: u16 = 0x50;

/// Size of the EDID base block
pub const EDID_LEN: usize = 128;

const KEY_RANGE: Range<usize> = 8..18;

/// Up to one EDID base block, with the number of bytes actually read
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityBlock {
    bytes: [u8; EDID_LEN],
    len: usize,
}

impl IdentityBlock {
    /// Copy at most [`EDID_LEN`] bytes of `data`
    pub fn from_bytes(data: &[u8]) -> Self {
        let len = data.len().min(EDID_LEN);
        let mut bytes = [0u8; EDID_LEN];
        bytes[..len].copy_from_slice(&data[..len]);
        Self { bytes, len }
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Comparison key, or `None` when the read was too short to contain it
    pub fn key(&self) -> Option<&[u8]> {
        if self.len < KEY_RANGE.end {
            return None;
        }
        self.bytes.get(KEY_RANGE)
    }

    /// Whether both blocks identify the same physical monitor
    pub fn matches(&self, other: &IdentityBlock) -> bool {
        match (self.key(), other.key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Read the EDID through the bus: select [`EDID_ADDR`], write offset 0,
    /// then read up to one block.
    pub fn read_from_bus<B: I2cBus>(bus: &mut B) -> io::Result<Self> {
        bus.set_slave_address(EDID_ADDR)?;
        if bus.write(&[0x00])? != 1 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "EDID offset write not accepted",
            ));
        }

        let mut buf = [0u8; EDID_LEN];
        let len = bus.read(&mut buf)?;
        Self::non_empty(&buf[..len.min(EDID_LEN)])
    }

    /// Read the EDID exposed by a DRM connector
    pub fn read_from_file(path: &Path) -> io::Result<Self> {
        let mut data = Vec::with_capacity(EDID_LEN);
        File::open(path)?
            .take(EDID_LEN as u64)
            .read_to_end(&mut data)?;
        Self::non_empty(&data)
    }

    fn non_empty(data: &[u8]) -> io::Result<Self> {
        if data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty EDID"));
        }
        Ok(Self::from_bytes(data))
    }
}

impl fmt::Debug for IdentityBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityBlock(len: {}, key: ", self.len)?;
        match self.key() {
            Some(key) => {
                for byte in key {
                    write!(f, "{byte:02x}")?;
                }
            }
            None => write!(f, "none")?,
        }
        write!(f, ")")
    }
}
