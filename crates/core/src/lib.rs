//! rgbctl-core: command headers, checksums, and USB transfer sequences.
//!
//! This crate encodes the vendor protocol used to configure an RGB-lit USB
//! peripheral. It builds 8-byte command headers, computes their checksum,
//! and drives the control/interrupt transfer sequences that apply a preset
//! mode or upload a custom per-LED frame. Bus I/O goes through the
//! [`transport::UsbTransport`] trait supplied by the caller.

pub mod custom;
pub mod device;
pub mod error;
pub mod header;
pub mod preset;
pub mod profile;
pub mod safety;
pub mod sequence;
pub mod transport;

pub use custom::{apply_custom_mode, UploadReport};
pub use device::{Color, CustomFrame, Mode};
pub use error::{Error, Result};
pub use preset::apply_preset_mode;
