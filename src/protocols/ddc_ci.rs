// SPDX-License-Identifier: GPL-3.0-only
//! DDC/CI (Display Data Channel Command Interface) protocol implementation
//!
//! DDC/CI is a standard protocol for controlling monitors over I2C bus.
//! It's supported by most modern external monitors via the video cable.
//!
//! Only the brightness VCP feature is used. Requests are fixed-length frames
//! terminated by an XOR checksum:
//!
//! - Get VCP: `[0x51, 0x82, 0x01, code, checksum]`
//! - Set VCP: `[0x51, 0x84, 0x03, code, 0x00, value, checksum]`
//!
//! A Get VCP reply is accepted when at least [`REPLY_MIN_LEN`] bytes come
//! back; the current value is the low byte at [`REPLY_VALUE_OFFSET`].

use std::io;

use super::{BrightnessControl, I2cBus};

/// I2C slave address of the DDC/CI command interface
pub const DDC_ADDR: u16 = 0x37;

/// VCP (Virtual Control Panel) code for brightness
pub const BRIGHTNESS_CODE: u8 = 0x10;

/// Highest brightness value sent to or accepted from a monitor
pub const MAX_BRIGHTNESS: u8 = 100;

/// Shortest Get VCP reply we trust
pub const REPLY_MIN_LEN: usize = 10;

/// Offset of the current-value low byte in a Get VCP reply
pub const REPLY_VALUE_OFFSET: usize = 9;

const SOURCE_ADDR: u8 = 0x51;
const GET_VCP_LEN: u8 = 0x82;
const SET_VCP_LEN: u8 = 0x84;
const GET_VCP_OPCODE: u8 = 0x01;
const SET_VCP_OPCODE: u8 = 0x03;
const REPLY_BUF_LEN: usize = 12;

/// XOR of every byte in `data`
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |sum, byte| sum ^ byte)
}

/// Build a Get VCP Feature request for `code`
pub fn get_vcp_frame(code: u8) -> [u8; 5] {
    let mut frame = [SOURCE_ADDR, GET_VCP_LEN, GET_VCP_OPCODE, code, 0x00];
    frame[4] = checksum(&frame[..4]);
    frame
}

/// Build a Set VCP Feature request; `value` is clamped to 0-100
pub fn set_vcp_frame(code: u8, value: u8) -> [u8; 7] {
    let value = value.min(MAX_BRIGHTNESS);
    let mut frame = [
        SOURCE_ADDR,
        SET_VCP_LEN,
        SET_VCP_OPCODE,
        code,
        0x00,
        value,
        0x00,
    ];
    frame[6] = checksum(&frame[..6]);
    frame
}

/// Extract the current value from a Get VCP reply
pub fn parse_vcp_reply(reply: &[u8]) -> Option<u8> {
    if reply.len() < REPLY_MIN_LEN {
        return None;
    }
    reply.get(REPLY_VALUE_OFFSET).copied()
}

/// DDC/CI display on an addressed I2C bus
#[derive(Debug)]
pub struct DdcCiDisplay<B> {
    bus: B,
}

impl<B: I2cBus> DdcCiDisplay<B> {
    /// Address the DDC/CI interface on `bus`
    pub fn attach(mut bus: B) -> io::Result<Self> {
        bus.set_slave_address(DDC_ADDR)?;
        Ok(Self { bus })
    }

    /// Give the bus back, e.g. to readdress it for an EDID read
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let written = self.bus.write(frame)?;
        if written != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short DDC/CI write: {written} of {} bytes", frame.len()),
            ));
        }
        Ok(())
    }
}

impl<B: I2cBus> BrightnessControl for DdcCiDisplay<B> {
    fn get_brightness(&mut self) -> io::Result<u8> {
        self.send(&get_vcp_frame(BRIGHTNESS_CODE))?;

        let mut reply = [0u8; REPLY_BUF_LEN];
        let len = self.bus.read(&mut reply)?;
        let reply = &reply[..len.min(REPLY_BUF_LEN)];

        parse_vcp_reply(reply)
            .map(|value| value.min(MAX_BRIGHTNESS))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short DDC/CI reply: {len} bytes"),
                )
            })
    }

    fn set_brightness(&mut self, value: u8) -> io::Result<()> {
        self.send(&set_vcp_frame(BRIGHTNESS_CODE, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::fake::{FakeBus, ddc_reply};

    #[test]
    fn test_checksum_folds_to_zero() {
        let get = get_vcp_frame(BRIGHTNESS_CODE);
        assert_eq!(checksum(&get), 0);

        for value in [0, 1, 55, 100] {
            let set = set_vcp_frame(BRIGHTNESS_CODE, value);
            assert_eq!(set[6], checksum(&set[..6]));
            assert_eq!(checksum(&set), 0);
        }
    }

    #[test]
    fn test_frame_layout() {
        assert_eq!(get_vcp_frame(0x10), [0x51, 0x82, 0x01, 0x10, 0xC2]);
        assert_eq!(
            set_vcp_frame(0x10, 55),
            [0x51, 0x84, 0x03, 0x10, 0x00, 55, 0x51 ^ 0x84 ^ 0x03 ^ 0x10 ^ 55]
        );
    }

    #[test]
    fn test_set_frame_clamps_value() {
        assert_eq!(set_vcp_frame(BRIGHTNESS_CODE, 250)[5], 100);
    }

    #[test]
    fn test_reply_needs_ten_bytes() {
        let reply = ddc_reply(42);
        assert_eq!(parse_vcp_reply(&reply), Some(42));
        assert_eq!(parse_vcp_reply(&reply[..10]), Some(42));
        assert_eq!(parse_vcp_reply(&reply[..9]), None);
        assert_eq!(parse_vcp_reply(&[]), None);
    }

    #[test]
    fn test_get_brightness_over_bus() {
        let bus = FakeBus::ddc(37, None);
        let log = bus.log();
        let mut display = DdcCiDisplay::attach(bus).unwrap();

        assert_eq!(display.get_brightness().unwrap(), 37);
        assert_eq!(log.borrow().addresses, vec![DDC_ADDR]);
        assert_eq!(log.borrow().writes, vec![get_vcp_frame(BRIGHTNESS_CODE).to_vec()]);
    }

    #[test]
    fn test_short_reply_is_error() {
        let mut bus = FakeBus::ddc(37, None);
        bus.reply_len = Some(6);
        let mut display = DdcCiDisplay::attach(bus).unwrap();
        let err = display.get_brightness().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_short_write_is_error() {
        let mut bus = FakeBus::ddc(37, None);
        bus.write_limit = Some(3);
        let mut display = DdcCiDisplay::attach(bus).unwrap();
        let err = display.set_brightness(10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_set_brightness_sends_one_frame() {
        let bus = FakeBus::ddc(37, None);
        let log = bus.log();
        let mut display = DdcCiDisplay::attach(bus).unwrap();

        display.set_brightness(55).unwrap();
        assert_eq!(log.borrow().set_values(), vec![55]);
    }
}
