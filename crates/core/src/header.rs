//! Command header encoding and decoding.
//!
//! Every operation starts with an 8-byte header sent as the payload of a
//! SET_REPORT control transfer:
//!
//! | offset | field        |
//! |--------|--------------|
//! | 0      | kind         |
//! | 1      | reserved (0) |
//! | 2      | mode / slot  |
//! | 3      | speed / length |
//! | 4      | brightness   |
//! | 5      | color        |
//! | 6      | reserved2    |
//! | 7      | checksum     |
//!
//! All fields are single bytes, so there is no byte-order conversion.

use crate::device::{Color, Mode};
use crate::error::{Error, Result};
use crate::safety;

/// Header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Number of leading bytes covered by the checksum.
pub const CHECKSUM_SPAN: usize = 7;

const RESERVED_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 7;

/// Command kinds (byte 0).
pub mod kinds {
    /// Apply a preset (or activate an uploaded custom frame).
    pub const PRESET: u8 = 0x08;
    /// Read back a config slot. Not used by the apply sequences.
    pub const READ_CONFIG: u8 = 0x92;
    /// Announce a custom frame upload over the interrupt endpoint.
    pub const CUSTOM_CONFIG: u8 = 0x12;
}

/// Mode byte sent before a preset is applied.
pub const PREPARE_PRESET: u8 = 0x33;
/// Mode byte that activates a freshly uploaded custom frame.
pub const ACTIVATE_CUSTOM: u8 = 0x34;

/// A command header before finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub kind: u8,
    /// Mode identifier, or config slot index.
    pub mode: u8,
    /// Animation speed, or number of payload chunks that follow.
    pub speed_length: u8,
    /// Brightness, 0..=50 on the device.
    pub brightness: u8,
    /// Predefined color selector.
    pub color: u8,
    /// Command-specific flag.
    pub reserved2: u8,
}

impl CommandHeader {
    /// Build a header. The reserved byte is always zero.
    pub fn new(
        kind: u8,
        mode: u8,
        speed_length: u8,
        brightness: u8,
        color: u8,
        reserved2: u8,
    ) -> Self {
        Self {
            kind,
            mode,
            speed_length,
            brightness,
            color,
            reserved2,
        }
    }

    /// Header that prepares the device for a preset.
    pub fn prepare_preset() -> Self {
        Self::new(kinds::PRESET, PREPARE_PRESET, 0x05, 0x32, 0x02, 0x01)
    }

    /// Header carrying the caller's preset settings.
    pub fn preset(mode: Mode, color: Color, brightness: u8, speed: u8) -> Self {
        Self::new(kinds::PRESET, mode.0, speed, brightness, color.0, 0x00)
    }

    /// Header announcing a custom frame of `chunks` interrupt packets.
    pub fn begin_custom(chunks: u8) -> Self {
        Self::new(kinds::CUSTOM_CONFIG, 0x01, chunks, 0x00, 0x00, 0x00)
    }

    /// Header that switches the device to the uploaded custom frame.
    pub fn activate_custom() -> Self {
        Self::new(kinds::PRESET, ACTIVATE_CUSTOM, 0x05, 0x32, 0x02, 0x01)
    }

    /// Serialize into the finalized 8-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [
            self.kind,
            0x00,
            self.mode,
            self.speed_length,
            self.brightness,
            self.color,
            self.reserved2,
            0x00,
        ];
        finalize(&mut buf);
        buf
    }

    /// Parse a finalized header, verifying the reserved byte and checksum.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let buf: &[u8; HEADER_LEN] = data.try_into().map_err(|_| {
            Error::InvalidHeader(format!(
                "expected {HEADER_LEN} bytes, got {}",
                data.len()
            ))
        })?;

        safety::validate_header_kind(buf[0])?;

        if buf[RESERVED_OFFSET] != 0 {
            return Err(Error::InvalidHeader(format!(
                "reserved byte is 0x{:02X}",
                buf[RESERVED_OFFSET]
            )));
        }

        let expected = checksum(&buf[..CHECKSUM_SPAN]);
        if buf[CHECKSUM_OFFSET] != expected {
            return Err(Error::InvalidHeader(format!(
                "checksum 0x{:02X}, expected 0x{expected:02X}",
                buf[CHECKSUM_OFFSET]
            )));
        }

        Ok(Self::new(buf[0], buf[2], buf[3], buf[4], buf[5], buf[6]))
    }
}

/// Checksum over header bytes: `0xFF - (sum mod 256)`.
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    0xFF - (sum & 0xFF) as u8
}

/// Zero the reserved byte and write the checksum in place.
///
/// Idempotent: the checksum only depends on the first seven bytes.
pub fn finalize(buf: &mut [u8; HEADER_LEN]) {
    buf[RESERVED_OFFSET] = 0;
    buf[CHECKSUM_OFFSET] = checksum(&buf[..CHECKSUM_SPAN]);
}
