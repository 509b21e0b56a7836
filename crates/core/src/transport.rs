//! USB transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that real USB devices and
//! mock devices share the same interface. Opening and closing the device
//! is the caller's business; the encoder only borrows a transport.

use crate::device::CONTROL_INTERFACE;
use crate::error::{Error, Result};
use crate::header::CommandHeader;
use std::time::Duration;
use tracing::trace;

/// Transfer timeout used by the apply sequences (`None` blocks indefinitely).
pub const TRANSFER_TIMEOUT: Option<Duration> = None;

/// Setup packet fields of a control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

/// HID class request: host-to-device, class, interface recipient.
pub const REQUEST_TYPE_CLASS_INTERFACE_OUT: u8 = 0x21;
/// HID SET_REPORT request.
pub const HID_SET_REPORT: u8 = 0x09;
/// Feature report type in the high byte of `wValue`, report ID 0.
pub const FEATURE_REPORT_ID_0: u16 = 0x0300;

/// Setup used for every command header.
pub const SET_REPORT: ControlSetup = ControlSetup {
    request_type: REQUEST_TYPE_CLASS_INTERFACE_OUT,
    request: HID_SET_REPORT,
    value: FEATURE_REPORT_ID_0,
    index: CONTROL_INTERFACE,
};

/// Abstraction over raw USB control and interrupt transfers.
///
/// Both methods return the number of bytes transferred. A failed transfer
/// is an `Err`; each call is attempted exactly once.
pub trait UsbTransport {
    /// Issue a host-to-device control transfer with `data` as payload.
    fn control_transfer(
        &self,
        setup: ControlSetup,
        data: &[u8],
        timeout: Option<Duration>,
    ) -> Result<usize>;

    /// Write `data` to an interrupt OUT endpoint.
    fn interrupt_transfer(
        &self,
        endpoint: u8,
        data: &[u8],
        timeout: Option<Duration>,
    ) -> Result<usize>;
}

/// Finalize a header and send it as a SET_REPORT control transfer.
pub fn send_header(transport: &dyn UsbTransport, header: &CommandHeader) -> Result<usize> {
    let encoded = header.encode();
    trace!(
        kind = format_args!("0x{:02X}", header.kind),
        mode = format_args!("0x{:02X}", header.mode),
        header_hex = format_args!("{:02X?}", encoded),
        "control TX"
    );
    transport.control_transfer(SET_REPORT, &encoded, TRANSFER_TIMEOUT)
}

/// Send one interrupt packet, treating a partial transfer as an error.
pub fn send_chunk(transport: &dyn UsbTransport, endpoint: u8, chunk: &[u8]) -> Result<usize> {
    trace!(
        endpoint = format_args!("0x{:02X}", endpoint),
        len = chunk.len(),
        "interrupt TX"
    );
    let transferred = transport.interrupt_transfer(endpoint, chunk, TRANSFER_TIMEOUT)?;
    if transferred != chunk.len() {
        return Err(Error::ShortWrite {
            expected: chunk.len(),
            actual: transferred,
        });
    }
    Ok(transferred)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FRAME_ENDPOINT;
    use mock::{MockTransport, Transfer};

    #[test]
    fn set_report_setup_matches_protocol() {
        assert_eq!(SET_REPORT.request_type, 0x21);
        assert_eq!(SET_REPORT.request, 0x09);
        assert_eq!(SET_REPORT.value, 0x0300);
        assert_eq!(SET_REPORT.index, 0x0003);
    }

    #[test]
    fn send_header_uses_set_report() {
        let mock = MockTransport::new();
        let n = send_header(&mock, &CommandHeader::prepare_preset()).unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            mock.transfers(),
            vec![Transfer::Control {
                setup: SET_REPORT,
                data: vec![0x08, 0x00, 0x33, 0x05, 0x32, 0x02, 0x01, 0x8A],
            }]
        );
    }

    #[test]
    fn send_header_propagates_failure() {
        let mock = MockTransport::new();
        mock.fail_control(0);
        let result = send_header(&mock, &CommandHeader::prepare_preset());
        assert!(matches!(result, Err(Error::Transfer(_))));
    }

    #[test]
    fn send_header_accepts_short_control_write() {
        let mock = MockTransport::new();
        mock.short_control(0, 3);
        assert_eq!(
            send_header(&mock, &CommandHeader::prepare_preset()).unwrap(),
            3
        );
    }

    #[test]
    fn send_chunk_detects_short_write() {
        let mock = MockTransport::new();
        mock.short_interrupt(0, 60);
        let result = send_chunk(&mock, FRAME_ENDPOINT, &[0xAA; 64]);
        assert!(matches!(
            result,
            Err(Error::ShortWrite {
                expected: 64,
                actual: 60
            })
        ));
    }

    #[test]
    fn send_chunk_full_write() {
        let mock = MockTransport::new();
        assert_eq!(send_chunk(&mock, FRAME_ENDPOINT, &[0x55; 64]).unwrap(), 64);
        assert_eq!(
            mock.transfers(),
            vec![Transfer::Interrupt {
                endpoint: FRAME_ENDPOINT,
                data: vec![0x55; 64],
            }]
        );
    }
}
