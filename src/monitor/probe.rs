// SPDX-License-Identifier: GPL-3.0-only
//! Bus device probing
//!
//! Most I2C adapters on a machine are not display links, so a failed probe
//! is the normal outcome and is only logged at debug level.

use std::io;
use std::path::{Path, PathBuf};

use crate::protocols::ddc_ci::DdcCiDisplay;
use crate::protocols::{BrightnessControl, BusOpener};

use super::edid::IdentityBlock;

/// A bus that answered DDC/CI and reported its EDID
#[derive(Debug, Clone)]
pub struct BusCandidate {
    pub index: u32,
    pub path: PathBuf,
    pub brightness: u8,
    pub identity: IdentityBlock,
}

/// Probe one bus; `None` means nothing controllable lives there
pub fn probe_bus<O: BusOpener>(opener: &O, index: u32, path: &Path) -> Option<BusCandidate> {
    match try_probe(opener, path) {
        Ok((brightness, identity)) => {
            debug!(
                device = %path.display(),
                brightness,
                ?identity,
                "DDC/CI device responded"
            );
            Some(BusCandidate {
                index,
                path: path.to_path_buf(),
                brightness,
                identity,
            })
        }
        Err(e) => {
            debug!(device = %path.display(), "Not a DDC/CI device: {}", e);
            None
        }
    }
}

fn try_probe<O: BusOpener>(opener: &O, path: &Path) -> io::Result<(u8, IdentityBlock)> {
    let bus = opener.open(path)?;
    let mut display = DdcCiDisplay::attach(bus)?;
    let brightness = display.get_brightness()?;

    let mut bus = display.into_bus();
    let identity = IdentityBlock::read_from_bus(&mut bus)?;
    Ok((brightness, identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::edid::EDID_ADDR;
    use crate::protocols::ddc_ci::DDC_ADDR;
    use crate::protocols::fake::{FakeBus, FakeOpener, edid};

    #[test]
    fn test_probe_success() {
        let bus = FakeBus::ddc(64, Some(edid(1)));
        let log = bus.log();
        let opener = FakeOpener::default().with("/dev/i2c-4", bus);

        let candidate = probe_bus(&opener, 4, Path::new("/dev/i2c-4")).unwrap();
        assert_eq!(candidate.index, 4);
        assert_eq!(candidate.brightness, 64);
        assert_eq!(candidate.identity.as_bytes(), &edid(1)[..]);
        assert_eq!(log.borrow().addresses, vec![DDC_ADDR, EDID_ADDR]);
    }

    #[test]
    fn test_probe_missing_device() {
        let opener = FakeOpener::default();
        assert!(probe_bus(&opener, 0, Path::new("/dev/i2c-0")).is_none());
    }

    #[test]
    fn test_probe_address_refused() {
        let mut bus = FakeBus::ddc(64, Some(edid(1)));
        bus.refuse_address = true;
        let opener = FakeOpener::default().with("/dev/i2c-1", bus);
        assert!(probe_bus(&opener, 1, Path::new("/dev/i2c-1")).is_none());
    }

    #[test]
    fn test_probe_no_ddc_reply() {
        let bus = FakeBus::silent(Some(edid(1)));
        let log = bus.log();
        let opener = FakeOpener::default().with("/dev/i2c-2", bus);

        assert!(probe_bus(&opener, 2, Path::new("/dev/i2c-2")).is_none());
        // The EDID is never read when DDC/CI is silent.
        assert_eq!(log.borrow().addresses, vec![DDC_ADDR]);
    }

    #[test]
    fn test_probe_short_reply() {
        let mut bus = FakeBus::ddc(64, Some(edid(1)));
        bus.reply_len = Some(9);
        let opener = FakeOpener::default().with("/dev/i2c-3", bus);
        assert!(probe_bus(&opener, 3, Path::new("/dev/i2c-3")).is_none());
    }

    #[test]
    fn test_probe_without_edid() {
        let bus = FakeBus::ddc(64, None);
        let opener = FakeOpener::default().with("/dev/i2c-5", bus);
        assert!(probe_bus(&opener, 5, Path::new("/dev/i2c-5")).is_none());
    }
}
