//! Custom per-LED frames.
//!
//! A custom frame is uploaded in three stages:
//!   1. A CUSTOM_CONFIG header announcing eight interrupt packets.
//!   2. Eight 64-byte interrupt transfers to endpoint 6 (OUT).
//!   3. A PRESET header with mode 0x34 that activates the frame.
//!
//! Chunk failures do not abort the upload. Every chunk is attempted and
//! the activation header is sent regardless; failed chunks are returned in
//! the [`UploadReport`].

use crate::device::{CustomFrame, CHUNK_COUNT, FRAME_ENDPOINT};
use crate::error::{Error, Result};
use crate::header::CommandHeader;
use crate::sequence::Sequence;
use crate::transport::{send_chunk, UsbTransport};
use tracing::{debug, info, warn};

/// A chunk that failed or was only partially written.
#[derive(Debug)]
pub struct ChunkFailure {
    /// Position of the chunk in the frame (0..8).
    pub index: usize,
    /// `Error::Transfer` or `Error::ShortWrite`.
    pub error: Error,
}

/// Outcome of the payload stage of a custom-frame upload.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub failed: Vec<ChunkFailure>,
}

impl UploadReport {
    /// Whether every chunk was written in full.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Indices of chunks that did not make it.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }

    /// Number of chunks written in full.
    pub fn chunks_written(&self) -> usize {
        CHUNK_COUNT - self.failed.len()
    }
}

/// Upload a custom frame and activate it.
///
/// Fails only if the announcing or activating control transfer fails.
pub fn apply_custom_mode(
    transport: &dyn UsbTransport,
    frame: &CustomFrame,
) -> Result<UploadReport> {
    let mut seq = Sequence::new(transport, "custom");
    seq.send_header(&CommandHeader::begin_custom(CHUNK_COUNT as u8))?;

    let report = stream_frame(seq.transport(), frame);
    seq.payload_streamed()?;

    seq.send_header(&CommandHeader::activate_custom())?;
    seq.finish()?;

    if report.is_complete() {
        info!("Custom frame applied");
    } else {
        warn!(
            failed = ?report.failed_indices(),
            "Custom frame applied with failed chunks"
        );
    }
    Ok(report)
}

fn stream_frame(transport: &dyn UsbTransport, frame: &CustomFrame) -> UploadReport {
    let mut report = UploadReport::default();

    for (index, chunk) in frame.chunks().enumerate() {
        match send_chunk(transport, FRAME_ENDPOINT, chunk) {
            Ok(_) => debug!(chunk = index, "interrupt transfer OK"),
            Err(error) => {
                warn!(chunk = index, error = %error, "interrupt transfer failed");
                report.failed.push(ChunkFailure { index, error });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{CHUNK_LEN, FRAME_LEN};
    use crate::transport::mock::{MockTransport, Transfer};

    /// Frame data where every byte encodes its chunk index and offset.
    fn patterned_data() -> [u8; FRAME_LEN] {
        let mut data = [0u8; FRAME_LEN];
        for (i, b) in data.iter_mut().enumerate() {
            *b = ((i / CHUNK_LEN) << 5) as u8 ^ (i % CHUNK_LEN) as u8;
        }
        data
    }

    fn patterned_frame() -> CustomFrame {
        CustomFrame::new(patterned_data())
    }

    #[test]
    fn transfer_order() {
        let mock = MockTransport::new();
        let report = apply_custom_mode(&mock, &patterned_frame()).unwrap();
        assert!(report.is_complete());

        let transfers = mock.transfers();
        assert_eq!(transfers.len(), 1 + CHUNK_COUNT + 1);
        assert!(matches!(transfers[0], Transfer::Control { .. }));
        for t in &transfers[1..=CHUNK_COUNT] {
            assert!(matches!(
                t,
                Transfer::Interrupt {
                    endpoint: FRAME_ENDPOINT,
                    ..
                }
            ));
        }
        assert!(matches!(transfers[CHUNK_COUNT + 1], Transfer::Control { .. }));
    }

    #[test]
    fn headers_match_protocol() {
        let mock = MockTransport::new();
        apply_custom_mode(&mock, &patterned_frame()).unwrap();
        let payloads = mock.control_payloads();
        assert_eq!(
            payloads[0],
            vec![0x12, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0xE4]
        );
        assert_eq!(
            payloads[1],
            vec![0x08, 0x00, 0x34, 0x05, 0x32, 0x02, 0x01, 0x89]
        );
    }

    #[test]
    fn chunks_are_frame_slices_in_order() {
        let mock = MockTransport::new();
        let data = patterned_data();
        apply_custom_mode(&mock, &CustomFrame::new(data)).unwrap();
        let chunks = mock.interrupt_payloads();
        assert_eq!(chunks.len(), CHUNK_COUNT);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(
                chunk.as_slice(),
                &data[i * CHUNK_LEN..(i + 1) * CHUNK_LEN]
            );
        }
    }

    #[test]
    fn chunk_failures_do_not_abort() {
        let mock = MockTransport::new();
        mock.fail_interrupt(1);
        mock.short_interrupt(4, 32);
        mock.fail_interrupt(7);

        let report = apply_custom_mode(&mock, &patterned_frame()).unwrap();
        assert_eq!(mock.interrupt_payloads().len(), CHUNK_COUNT);
        assert_eq!(mock.control_payloads().len(), 2);
        assert_eq!(report.failed_indices(), vec![1, 4, 7]);
        assert_eq!(report.chunks_written(), 5);
        assert!(matches!(report.failed[0].error, Error::Transfer(_)));
        assert!(matches!(
            report.failed[1].error,
            Error::ShortWrite {
                expected: 64,
                actual: 32
            }
        ));
    }

    #[test]
    fn succeeds_when_every_chunk_fails() {
        let mock = MockTransport::new();
        for i in 0..CHUNK_COUNT {
            mock.fail_interrupt(i);
        }
        let report = apply_custom_mode(&mock, &patterned_frame()).unwrap();
        assert_eq!(report.failed.len(), CHUNK_COUNT);
        assert_eq!(report.chunks_written(), 0);
        assert_eq!(mock.control_payloads().len(), 2);
    }

    #[test]
    fn first_header_failure_aborts() {
        let mock = MockTransport::new();
        mock.fail_control(0);
        let result = apply_custom_mode(&mock, &patterned_frame());
        assert!(matches!(result, Err(Error::ControlTransfer { step: 1, .. })));
        assert_eq!(mock.transfers().len(), 1);
    }

    #[test]
    fn activation_failure_is_fatal() {
        let mock = MockTransport::new();
        mock.fail_control(1);
        let result = apply_custom_mode(&mock, &patterned_frame());
        assert!(matches!(result, Err(Error::ControlTransfer { step: 2, .. })));
        assert_eq!(mock.interrupt_payloads().len(), CHUNK_COUNT);
    }
}
