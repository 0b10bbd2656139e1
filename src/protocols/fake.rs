//! Scripted bus doubles for tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::ddc_ci::{DDC_ADDR, checksum};
use super::{BusOpener, I2cBus};
use crate::monitor::edid::EDID_ADDR;

/// Everything a fake bus saw
#[derive(Debug, Default)]
pub struct BusLog {
    pub addresses: Vec<u16>,
    pub writes: Vec<Vec<u8>>,
}

impl BusLog {
    /// Values of every Set VCP frame written so far
    pub fn set_values(&self) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|w| w.len() == 7 && w[1] == 0x84)
            .map(|w| w[5])
            .collect()
    }
}

/// A monitor's Get VCP reply carrying `value`
pub fn ddc_reply(value: u8) -> [u8; 11] {
    let mut reply = [0x6E, 0x88, 0x02, 0x00, 0x10, 0x00, 0x00, 0x64, 0x00, value, 0x00];
    reply[10] = checksum(&reply[..10]);
    reply
}

/// A 128-byte EDID whose identity key is derived from `id`
pub fn edid(id: u8) -> Vec<u8> {
    edid_with_noise(id, 0)
}

/// Same identity key as [`edid`], different bytes everywhere else
pub fn edid_with_noise(id: u8, noise: u8) -> Vec<u8> {
    let mut block = vec![noise; 128];
    block[..8].copy_from_slice(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    block[8..18].copy_from_slice(&[0x10, 0xAC, id, 0x40, 0x4C, 0x53, 0x30, id, 0x12, 0x1D]);
    block
}

#[derive(Debug, Clone)]
pub struct FakeBus {
    log: Rc<RefCell<BusLog>>,
    address: u16,
    brightness: Option<u8>,
    edid: Option<Vec<u8>>,
    pub reply_len: Option<usize>,
    pub write_limit: Option<usize>,
    pub refuse_address: bool,
    pub fail_set_after: Option<usize>,
}

impl FakeBus {
    /// A monitor answering DDC/CI with `brightness`
    pub fn ddc(brightness: u8, edid: Option<Vec<u8>>) -> Self {
        Self {
            log: Rc::default(),
            address: 0,
            brightness: Some(brightness),
            edid,
            reply_len: None,
            write_limit: None,
            refuse_address: false,
            fail_set_after: None,
        }
    }

    /// An adapter with nothing answering on the DDC/CI address
    pub fn silent(edid: Option<Vec<u8>>) -> Self {
        Self {
            brightness: None,
            ..Self::ddc(0, edid)
        }
    }

    pub fn log(&self) -> Rc<RefCell<BusLog>> {
        Rc::clone(&self.log)
    }

    fn nack() -> io::Error {
        io::Error::other("no acknowledge from slave")
    }
}

impl I2cBus for FakeBus {
    fn set_slave_address(&mut self, address: u16) -> io::Result<()> {
        if self.refuse_address {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.address = address;
        self.log.borrow_mut().addresses.push(address);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.address {
            DDC_ADDR if self.brightness.is_none() => return Err(Self::nack()),
            EDID_ADDR if self.edid.is_none() => return Err(Self::nack()),
            _ => {}
        }
        let is_set = data.len() == 7 && data[1] == 0x84;
        if is_set {
            if let Some(limit) = self.fail_set_after {
                if self.log.borrow().set_values().len() >= limit {
                    return Err(Self::nack());
                }
            }
        }
        let accepted = self.write_limit.map_or(data.len(), |l| l.min(data.len()));
        self.log.borrow_mut().writes.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let source: Vec<u8> = match self.address {
            DDC_ADDR => match self.brightness {
                Some(value) => ddc_reply(value).to_vec(),
                None => return Err(Self::nack()),
            },
            EDID_ADDR => match &self.edid {
                Some(block) => block.clone(),
                None => return Err(Self::nack()),
            },
            _ => return Err(Self::nack()),
        };
        let len = self
            .reply_len
            .unwrap_or(source.len())
            .min(source.len())
            .min(buf.len());
        buf[..len].copy_from_slice(&source[..len]);
        Ok(len)
    }
}

/// Hands out clones of registered fake buses by path
#[derive(Debug, Default)]
pub struct FakeOpener {
    buses: HashMap<PathBuf, FakeBus>,
}

impl FakeOpener {
    pub fn with(mut self, path: &str, bus: FakeBus) -> Self {
        self.buses.insert(PathBuf::from(path), bus);
        self
    }
}

impl BusOpener for FakeOpener {
    type Bus = FakeBus;

    fn open(&self, path: &Path) -> io::Result<FakeBus> {
        self.buses
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
