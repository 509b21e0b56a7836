//! Device model: USB addressing, lighting selectors, and custom frames.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// HID interface that receives SET_REPORT control transfers.
pub const CONTROL_INTERFACE: u16 = 0x0003;

/// USB endpoint direction bit for host-to-device transfers.
pub const ENDPOINT_OUT: u8 = 0x00;
/// Endpoint number of the interrupt OUT pipe used for custom frames.
pub const FRAME_ENDPOINT_NUMBER: u8 = 6;
/// Interrupt OUT endpoint address (`6 | OUT`).
pub const FRAME_ENDPOINT: u8 = FRAME_ENDPOINT_NUMBER | ENDPOINT_OUT;

/// Size of one interrupt packet.
pub const CHUNK_LEN: usize = 64;
/// Number of interrupt packets in a custom frame.
pub const CHUNK_COUNT: usize = 8;
/// Total size of a custom frame.
pub const FRAME_LEN: usize = CHUNK_LEN * CHUNK_COUNT;

/// Lighting mode selector, passed through to the device verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(pub u8);

impl Mode {
    pub const BREATHING: Mode = Mode(0x02);

    /// Named modes accepted by [`Mode::from_name`].
    pub const NAMED: &'static [(&'static str, Mode)] = &[("breathing", Mode::BREATHING)];

    /// Look up a mode by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        lookup(Self::NAMED, name)
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .or_else(|| parse_byte(s).map(Mode))
            .ok_or_else(|| unknown_selector("mode", s, Self::NAMED))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_selector(f, Self::NAMED, *self, self.0)
    }
}

/// Predefined color selector, passed through to the device verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u8);

impl Color {
    pub const RED: Color = Color(0x01);

    /// Named colors accepted by [`Color::from_name`].
    pub const NAMED: &'static [(&'static str, Color)] = &[("red", Color::RED)];

    /// Look up a color by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        lookup(Self::NAMED, name)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .or_else(|| parse_byte(s).map(Color))
            .ok_or_else(|| unknown_selector("color", s, Self::NAMED))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_selector(f, Self::NAMED, *self, self.0)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    let lower = name.to_lowercase();
    table
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, value)| *value)
}

fn unknown_selector<T>(field: &str, input: &str, table: &[(&str, T)]) -> Error {
    let names: Vec<&str> = table.iter().map(|(n, _)| *n).collect();
    Error::UnknownSelector(format!(
        "{field} '{input}' (expected 0-255 or one of: {})",
        names.join(", ")
    ))
}

fn display_selector<T: PartialEq>(
    f: &mut std::fmt::Formatter<'_>,
    table: &[(&str, T)],
    value: T,
    raw: u8,
) -> std::fmt::Result {
    match table.iter().find(|(_, v)| *v == value) {
        Some((name, _)) => write!(f, "{name}"),
        None => write!(f, "0x{raw:02X}"),
    }
}

/// Parse a byte as decimal or `0x`-prefixed hex.
pub fn parse_byte(s: &str) -> Option<u8> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// A 512-byte custom frame, uploaded as eight 64-byte interrupt packets.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomFrame([u8; FRAME_LEN]);

impl CustomFrame {
    pub fn new(data: [u8; FRAME_LEN]) -> Self {
        Self(data)
    }

    /// Copy a frame from a slice that must be exactly [`FRAME_LEN`] bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let buf: [u8; FRAME_LEN] = data.try_into().map_err(|_| Error::InvalidFrameLength {
            expected: FRAME_LEN,
            actual: data.len(),
        })?;
        Ok(Self(buf))
    }

    /// The interrupt packets in transmission order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.0.chunks_exact(CHUNK_LEN)
    }
}

impl std::fmt::Debug for CustomFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomFrame")
            .field("len", &FRAME_LEN)
            .field("head", &format_args!("{:02X?}", &self.0[..8]))
            .finish()
    }
}

/// Explicit USB device selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelector {
    pub vid: u16,
    pub pid: u16,
    #[serde(default = "default_interface")]
    pub interface: u16,
}

fn default_interface() -> u16 {
    CONTROL_INTERFACE
}
