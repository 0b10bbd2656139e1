// SPDX-License-Identifier: GPL-3.0-only
//! Linux i2c-dev character devices

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use super::{BusOpener, I2cBus};

/// `I2C_SLAVE` request from `linux/i2c-dev.h`
const I2C_SLAVE: u32 = 0x0703;

/// An open `/dev/i2c-N` node
#[derive(Debug)]
pub struct I2cDevice {
    file: File,
    path: PathBuf,
}

impl I2cDevice {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl I2cBus for I2cDevice {
    fn set_slave_address(&mut self, address: u16) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: fd is owned by self.file and stays open for the call.
        let rc = unsafe { libc::ioctl(fd, I2C_SLAVE as _, libc::c_ulong::from(address)) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Opens real i2c-dev nodes
#[derive(Debug, Default, Clone, Copy)]
pub struct DevI2c;

impl BusOpener for DevI2c {
    type Bus = I2cDevice;

    fn open(&self, path: &Path) -> io::Result<I2cDevice> {
        let device = I2cDevice::open(path)?;
        debug!(device = %device.path().display(), "Opened I2C device");
        Ok(device)
    }
}
