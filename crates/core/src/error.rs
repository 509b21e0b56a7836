//! Error types for rgbctl-core.

use thiserror::Error;

use crate::sequence::{SequenceEvent, SequenceState};

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport reported a failed USB transfer.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// An interrupt transfer moved a different number of bytes than requested.
    #[error("short write: transferred {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    /// The first or final control transfer of a sequence failed.
    #[error("control transfer {step} failed: {source}")]
    ControlTransfer {
        step: u8,
        #[source]
        source: Box<Error>,
    },

    /// A sequence was driven through a transition it does not allow.
    #[error("invalid sequence transition: {event:?} in state {state:?}")]
    InvalidTransition {
        state: SequenceState,
        event: SequenceEvent,
    },

    /// Bytes could not be decoded as a command header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Custom frame data has the wrong size.
    #[error("invalid frame length: got {actual} bytes, expected {expected}")]
    InvalidFrameLength { expected: usize, actual: usize },

    /// A mode or color name that is neither known nor a byte value.
    #[error("unknown selector: {0}")]
    UnknownSelector(String),

    /// Value out of the range the device accepts.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// No device matched the requested selector.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Lighting profile load/save error.
    #[error("profile error: {0}")]
    Profile(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
