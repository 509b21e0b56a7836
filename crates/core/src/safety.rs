//! Caller-side validation of lighting parameters.
//!
//! The apply sequences forward every value verbatim and leave range
//! checking to the firmware. These helpers let callers (the CLI, profile
//! loading) reject bad input before any USB traffic happens.
//!
//! ## Brightness
//! - **Range**: 0 – 50
//! - The prepare header always sends 0x32 (50), the device maximum.
//!
//! ## Header kinds
//! - Only PRESET (0x08), READ_CONFIG (0x92), and CUSTOM_CONFIG (0x12) are
//!   known. Decoded headers with any other kind are rejected.

use crate::error::{Error, Result};
use crate::header::kinds;

pub const BRIGHTNESS_MIN: u8 = 0;
pub const BRIGHTNESS_MAX: u8 = 50;

/// Command kinds the device is known to understand.
const KNOWN_KINDS: &[u8] = &[kinds::PRESET, kinds::READ_CONFIG, kinds::CUSTOM_CONFIG];

/// Validate a brightness value.
pub fn validate_brightness(brightness: u8) -> Result<u8> {
    if !(BRIGHTNESS_MIN..=BRIGHTNESS_MAX).contains(&brightness) {
        return Err(Error::OutOfRange {
            field: "brightness",
            value: brightness as u32,
            min: BRIGHTNESS_MIN as u32,
            max: BRIGHTNESS_MAX as u32,
        });
    }
    Ok(brightness)
}

/// Validate that a header kind byte is one of the known command kinds.
pub fn validate_header_kind(kind: u8) -> Result<()> {
    if KNOWN_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(Error::InvalidHeader(format!("unknown kind 0x{kind:02X}")))
    }
}
