//! Built-in lighting modes.
//!
//! Applying a preset takes two SET_REPORT control transfers:
//!   1. A fixed "prepare" header (mode 0x33).
//!   2. A header carrying the requested mode, speed, brightness, and color.
//!
//! Mode, color, and brightness are forwarded as-is; range checks are up to
//! the caller (see [`crate::safety`]).

use crate::device::{Color, Mode};
use crate::error::Result;
use crate::header::CommandHeader;
use crate::sequence::Sequence;
use crate::transport::UsbTransport;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings for a built-in lighting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSettings {
    pub mode: Mode,
    pub color: Color,
    /// 0..=50 on the device.
    pub brightness: u8,
    /// Device-specific animation speed.
    pub speed: u8,
}

/// Apply a built-in mode.
///
/// If the prepare transfer fails the settings transfer is not attempted.
pub fn apply_preset_mode(
    transport: &dyn UsbTransport,
    mode: Mode,
    color: Color,
    brightness: u8,
    speed: u8,
) -> Result<()> {
    let mut seq = Sequence::new(transport, "preset");
    seq.send_header(&CommandHeader::prepare_preset())?;
    seq.send_header(&CommandHeader::preset(mode, color, brightness, speed))?;
    seq.finish()?;

    info!(%mode, %color, brightness, speed, "Preset mode applied");
    Ok(())
}

/// Apply a built-in mode from a settings record.
pub fn apply_preset(transport: &dyn UsbTransport, settings: &PresetSettings) -> Result<()> {
    apply_preset_mode(
        transport,
        settings.mode,
        settings.color,
        settings.brightness,
        settings.speed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::header::checksum;
    use crate::transport::mock::{MockTransport, Transfer};
    use crate::transport::SET_REPORT;

    #[test]
    fn sends_prepare_then_settings() {
        let mock = MockTransport::new();
        apply_preset_mode(&mock, Mode(0x07), Color(0x04), 40, 9).unwrap();

        let payloads = mock.control_payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(
            payloads[0],
            vec![0x08, 0x00, 0x33, 0x05, 0x32, 0x02, 0x01, 0x8A]
        );
        let second = &payloads[1];
        assert_eq!(&second[..7], &[0x08, 0x00, 0x07, 9, 40, 0x04, 0x00]);
        assert_eq!(second[7], checksum(&second[..7]));
    }

    #[test]
    fn prepare_header_ignores_caller_values() {
        let mock = MockTransport::new();
        apply_preset_mode(&mock, Mode(0xFF), Color(0xFF), 0xFF, 0xFF).unwrap();
        assert_eq!(
            mock.control_payloads()[0],
            vec![0x08, 0x00, 0x33, 0x05, 0x32, 0x02, 0x01, 0x8A]
        );
    }

    #[test]
    fn every_transfer_is_set_report() {
        let mock = MockTransport::new();
        apply_preset_mode(&mock, Mode::BREATHING, Color::RED, 10, 1).unwrap();
        for transfer in mock.transfers() {
            match transfer {
                Transfer::Control { setup, data } => {
                    assert_eq!(setup, SET_REPORT);
                    assert_eq!(data.len(), 8);
                }
                other => panic!("unexpected transfer: {other:?}"),
            }
        }
    }

    #[test]
    fn first_failure_skips_second_transfer() {
        let mock = MockTransport::new();
        mock.fail_control(0);
        let result = apply_preset_mode(&mock, Mode::BREATHING, Color::RED, 25, 3);
        assert!(matches!(result, Err(Error::ControlTransfer { step: 1, .. })));
        assert_eq!(mock.transfers().len(), 1);
    }

    #[test]
    fn second_failure_is_reported() {
        let mock = MockTransport::new();
        mock.fail_control(1);
        let result = apply_preset_mode(&mock, Mode::BREATHING, Color::RED, 25, 3);
        assert!(matches!(result, Err(Error::ControlTransfer { step: 2, .. })));
        assert_eq!(mock.transfers().len(), 2);
    }

    #[test]
    fn short_control_writes_do_not_fail() {
        let mock = MockTransport::new();
        mock.short_control(0, 0);
        mock.short_control(1, 4);
        apply_preset_mode(&mock, Mode::BREATHING, Color::RED, 25, 3).unwrap();
        assert_eq!(mock.control_payloads().len(), 2);
    }

    #[test]
    fn out_of_range_brightness_is_forwarded() {
        let mock = MockTransport::new();
        apply_preset_mode(&mock, Mode::BREATHING, Color::RED, 200, 3).unwrap();
        assert_eq!(mock.control_payloads()[1][4], 200);
    }

    #[test]
    fn apply_preset_uses_settings() {
        let mock = MockTransport::new();
        let settings = PresetSettings {
            mode: Mode(0x05),
            color: Color(0x03),
            brightness: 50,
            speed: 2,
        };
        apply_preset(&mock, &settings).unwrap();
        assert_eq!(
            &mock.control_payloads()[1][..7],
            &[0x08, 0x00, 0x05, 0x02, 50, 0x03, 0x00]
        );
    }
}
