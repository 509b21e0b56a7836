//! Transfer sequencing shared by the preset and custom-frame operations.
//!
//! Both operations follow the same shape:
//!
//! ```text
//! Idle -> FirstHeaderSent -> [PayloadStreamed] -> FinalHeaderSent -> Done
//! ```
//!
//! A failed header transfer moves the sequence to `Failed`, which is
//! terminal. Payload streaming never fails the sequence on its own.

use crate::error::{Error, Result};
use crate::header::CommandHeader;
use crate::transport::{send_header, UsbTransport};
use tracing::{debug, warn};

/// Progress of an apply sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    FirstHeaderSent,
    PayloadStreamed,
    FinalHeaderSent,
    Done,
    Failed,
}

/// Input to the sequence state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    /// A header control transfer was issued.
    HeaderIssued,
    /// The header transfer just issued failed.
    HeaderFailed,
    /// Every payload chunk has been attempted.
    PayloadFinished,
    /// The final header was accepted.
    Finished,
}

impl SequenceState {
    /// Apply an event, rejecting transitions the protocol does not allow.
    pub fn on(self, event: SequenceEvent) -> Result<Self> {
        use SequenceEvent::*;
        use SequenceState::*;

        let next = match (self, event) {
            (Idle, HeaderIssued) => FirstHeaderSent,
            (FirstHeaderSent, PayloadFinished) => PayloadStreamed,
            (FirstHeaderSent | PayloadStreamed, HeaderIssued) => FinalHeaderSent,
            (FirstHeaderSent | FinalHeaderSent, HeaderFailed) => Failed,
            (FinalHeaderSent, Finished) => Done,
            (state, event) => return Err(Error::InvalidTransition { state, event }),
        };
        Ok(next)
    }
}

/// Drives one apply sequence over a borrowed transport.
pub struct Sequence<'a> {
    transport: &'a dyn UsbTransport,
    name: &'static str,
    state: SequenceState,
}

impl<'a> Sequence<'a> {
    pub fn new(transport: &'a dyn UsbTransport, name: &'static str) -> Self {
        Self {
            transport,
            name,
            state: SequenceState::Idle,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn transport(&self) -> &'a dyn UsbTransport {
        self.transport
    }

    fn advance(&mut self, event: SequenceEvent) -> Result<()> {
        let next = self.state.on(event)?;
        debug!(
            sequence = self.name,
            from = ?self.state,
            to = ?next,
            "sequence transition"
        );
        self.state = next;
        Ok(())
    }

    /// Send the first or final header. Failure is fatal to the sequence.
    pub fn send_header(&mut self, header: &CommandHeader) -> Result<()> {
        let step = if self.state == SequenceState::Idle { 1 } else { 2 };
        self.advance(SequenceEvent::HeaderIssued)?;

        match send_header(self.transport, header) {
            Ok(_) => {
                debug!(sequence = self.name, step, "control transfer OK");
                Ok(())
            }
            Err(e) => {
                warn!(sequence = self.name, step, error = %e, "control transfer failed");
                self.advance(SequenceEvent::HeaderFailed)?;
                Err(Error::ControlTransfer {
                    step,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Mark the payload as fully attempted.
    pub fn payload_streamed(&mut self) -> Result<()> {
        self.advance(SequenceEvent::PayloadFinished)
    }

    /// Close the sequence after the final header was accepted.
    pub fn finish(mut self) -> Result<SequenceState> {
        self.advance(SequenceEvent::Finished)?;
        Ok(self.state)
    }
}
