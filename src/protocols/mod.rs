// SPDX-License-Identifier: GPL-3.0-only
//! Display brightness control protocols
//!
//! The DDC/CI client talks to the monitor through the [`I2cBus`] seam so the
//! frame handling can be exercised without real hardware. [`i2c_dev`] holds
//! the Linux `/dev/i2c-N` implementation.

pub mod ddc_ci;
pub mod i2c_dev;

#[cfg(test)]
pub mod fake;

use std::io;
use std::path::Path;

/// Raw access to one I2C adapter
pub trait I2cBus {
    /// Select the 7-bit slave address used by subsequent reads and writes
    fn set_slave_address(&mut self, address: u16) -> io::Result<()>;

    /// Write bytes to the selected slave, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read bytes from the selected slave, returning how many arrived
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens bus devices by path
pub trait BusOpener {
    type Bus: I2cBus;

    fn open(&self, path: &Path) -> io::Result<Self::Bus>;
}

/// Common trait for brightness-capable displays
pub trait BrightnessControl {
    /// Get the current brightness (0-100)
    fn get_brightness(&mut self) -> io::Result<u8>;

    /// Set the brightness (0-100)
    fn set_brightness(&mut self, value: u8) -> io::Result<()>;
}
