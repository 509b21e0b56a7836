//! rgbctl CLI: command-line RGB lighting configuration tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rgbctl_core::device::{
    Color, DeviceSelector, Mode, CHUNK_COUNT, CONTROL_INTERFACE, ENDPOINT_OUT,
};
use rgbctl_core::error::Error as CoreError;
use rgbctl_core::header::CommandHeader;
use rgbctl_core::preset::PresetSettings;
use rgbctl_core::profile::{self, Applied, Effect, Profile};
use rgbctl_core::transport::{
    ControlSetup, UsbTransport, HID_SET_REPORT, REQUEST_TYPE_CLASS_INTERFACE_OUT,
};
use rgbctl_core::UploadReport;

/// HID report type for feature reports (high byte of `wValue`).
const FEATURE_REPORT_TYPE: u16 = 0x03;

/// Transport backed by a hidapi handle on the lighting interface.
///
/// SET_REPORT control transfers become feature reports and interrupt OUT
/// transfers become output report writes, both with report ID 0.
struct CliHidTransport {
    device: hidapi::HidDevice,
}

impl CliHidTransport {
    fn open(selector: DeviceSelector) -> Result<Self> {
        let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;
        let info = api
            .device_list()
            .find(|d| {
                d.vendor_id() == selector.vid
                    && d.product_id() == selector.pid
                    && d.interface_number() == i32::from(selector.interface)
            })
            .ok_or_else(|| {
                CoreError::DeviceNotFound(format!(
                    "VID=0x{:04X} PID=0x{:04X} interface {}",
                    selector.vid, selector.pid, selector.interface
                ))
            })?;

        tracing::info!(
            vid = format_args!("0x{:04X}", selector.vid),
            pid = format_args!("0x{:04X}", selector.pid),
            interface = selector.interface,
            path = %info.path().to_string_lossy(),
            "Opening HID interface"
        );

        let device = info.open_device(&api).map_err(|e| {
            anyhow::anyhow!(
                "open HID device (VID=0x{:04X} PID=0x{:04X}): {e}",
                selector.vid,
                selector.pid
            )
        })?;

        Ok(Self { device })
    }
}

fn with_report_id(report_id: u8, data: &[u8]) -> Vec<u8> {
    let mut report = Vec::with_capacity(data.len() + 1);
    report.push(report_id);
    report.extend_from_slice(data);
    report
}

/// Map a SET_REPORT control transfer onto a hidapi feature report buffer.
///
/// The report ID comes from the low byte of `wValue`.
fn feature_report(setup: ControlSetup, data: &[u8]) -> rgbctl_core::Result<Vec<u8>> {
    if setup.request_type != REQUEST_TYPE_CLASS_INTERFACE_OUT
        || setup.request != HID_SET_REPORT
        || setup.value >> 8 != FEATURE_REPORT_TYPE
    {
        return Err(CoreError::Hid(format!(
            "unsupported control request: {setup:?}"
        )));
    }
    Ok(with_report_id((setup.value & 0xFF) as u8, data))
}

/// Payload bytes in a hidapi write count, which includes the report ID.
fn payload_len(written: usize) -> usize {
    written.saturating_sub(1)
}

impl UsbTransport for CliHidTransport {
    fn control_transfer(
        &self,
        setup: ControlSetup,
        data: &[u8],
        _timeout: Option<Duration>,
    ) -> rgbctl_core::Result<usize> {
        let report = feature_report(setup, data)?;
        self.device
            .send_feature_report(&report)
            .map_err(|e| CoreError::Transfer(format!("send_feature_report: {e}")))?;
        Ok(data.len())
    }

    fn interrupt_transfer(
        &self,
        endpoint: u8,
        data: &[u8],
        _timeout: Option<Duration>,
    ) -> rgbctl_core::Result<usize> {
        if endpoint & 0x80 != ENDPOINT_OUT {
            return Err(CoreError::Hid(format!(
                "endpoint 0x{endpoint:02X} is not an OUT endpoint"
            )));
        }

        let report = with_report_id(0x00, data);
        let written = self
            .device
            .write(&report)
            .map_err(|e| CoreError::Transfer(format!("write: {e}")))?;
        Ok(payload_len(written))
    }
}

/// Transport that prints each transfer instead of touching hardware.
struct DryRunTransport;

impl UsbTransport for DryRunTransport {
    fn control_transfer(
        &self,
        setup: ControlSetup,
        data: &[u8],
        _timeout: Option<Duration>,
    ) -> rgbctl_core::Result<usize> {
        let decoded = match CommandHeader::decode(data) {
            Ok(header) => format!("{header:?}"),
            Err(e) => e.to_string(),
        };
        println!(
            "CONTROL type=0x{:02X} req=0x{:02X} value=0x{:04X} index=0x{:04X} data={} ({decoded})",
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            hex(data)
        );
        Ok(data.len())
    }

    fn interrupt_transfer(
        &self,
        endpoint: u8,
        data: &[u8],
        _timeout: Option<Duration>,
    ) -> rgbctl_core::Result<usize> {
        println!("INTERRUPT ep=0x{endpoint:02X} data={}", hex(data));
        Ok(data.len())
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02X}")).collect()
}

fn parse_u16(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_u8(s: &str) -> std::result::Result<u8, String> {
    rgbctl_core::device::parse_byte(s).ok_or_else(|| format!("invalid byte '{s}'"))
}

#[derive(Parser)]
#[command(name = "rgbctl", version, about = "USB RGB lighting configuration")]
struct Cli {
    /// USB vendor ID (decimal or 0x-prefixed hex).
    #[arg(long, global = true, value_parser = parse_u16)]
    vid: Option<u16>,
    /// USB product ID (decimal or 0x-prefixed hex).
    #[arg(long, global = true, value_parser = parse_u16)]
    pid: Option<u16>,
    /// HID interface number that accepts lighting commands.
    #[arg(long, global = true, default_value_t = CONTROL_INTERFACE)]
    interface: u16,
    /// Print transfers instead of sending them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PresetArgs {
    /// Mode name (breathing) or raw byte.
    #[arg(long)]
    mode: Mode,
    /// Color name (red) or raw byte.
    #[arg(long)]
    color: Color,
    /// Brightness (0-50).
    #[arg(long)]
    brightness: u8,
    /// Animation speed.
    #[arg(long, default_value_t = 3)]
    speed: u8,
}

impl PresetArgs {
    fn settings(&self) -> Result<PresetSettings> {
        Ok(PresetSettings {
            mode: self.mode,
            color: self.color,
            brightness: rgbctl_core::safety::validate_brightness(self.brightness)?,
            speed: self.speed,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a built-in lighting mode.
    Preset(PresetArgs),
    /// Upload and activate a 512-byte custom frame file.
    Custom {
        /// Path to the raw frame data.
        frame: PathBuf,
    },
    /// Apply a saved JSON profile.
    Apply {
        /// Path to the profile.
        profile: PathBuf,
    },
    /// Write a preset profile to a JSON file.
    SaveProfile {
        /// Destination path.
        path: PathBuf,
        /// Profile display name.
        #[arg(long, default_value = "Default")]
        name: String,
        #[command(flatten)]
        preset: PresetArgs,
    },
    /// Print a finalized command header as hex.
    Header {
        #[arg(value_parser = parse_u8)]
        kind: u8,
        #[arg(value_parser = parse_u8)]
        mode: u8,
        #[arg(value_parser = parse_u8)]
        speed_length: u8,
        #[arg(value_parser = parse_u8)]
        brightness: u8,
        #[arg(value_parser = parse_u8)]
        color: u8,
        #[arg(value_parser = parse_u8, default_value = "0")]
        reserved2: u8,
    },
}

impl Cli {
    /// Device selection from flags, falling back to a profile's selector.
    fn selector(&self, fallback: Option<DeviceSelector>) -> Result<DeviceSelector> {
        resolve_selector(self.vid, self.pid, self.interface, fallback)
    }

    fn transport(&self, fallback: Option<DeviceSelector>) -> Result<Box<dyn UsbTransport>> {
        if self.dry_run {
            return Ok(Box::new(DryRunTransport));
        }
        Ok(Box::new(CliHidTransport::open(self.selector(fallback)?)?))
    }
}

/// Flags win over the fallback; a lone `--vid` or `--pid` is an error.
fn resolve_selector(
    vid: Option<u16>,
    pid: Option<u16>,
    interface: u16,
    fallback: Option<DeviceSelector>,
) -> Result<DeviceSelector> {
    match (vid, pid) {
        (Some(vid), Some(pid)) => Ok(DeviceSelector {
            vid,
            pid,
            interface,
        }),
        (None, None) => fallback.ok_or_else(|| {
            anyhow::anyhow!("No device selected: pass --vid and --pid (or use --dry-run)")
        }),
        _ => Err(anyhow::anyhow!("--vid and --pid must be given together")),
    }
}

fn print_upload_report(report: &UploadReport) {
    if report.is_complete() {
        println!("Custom frame applied");
    } else {
        println!(
            "Custom frame applied; {} of {CHUNK_COUNT} chunks written, failed: {:?}",
            report.chunks_written(),
            report.failed_indices()
        );
        for failure in &report.failed {
            println!("  chunk {}: {}", failure.index, failure.error);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Preset(args) => {
            let settings = args.settings()?;
            let transport = cli.transport(None)?;
            rgbctl_core::preset::apply_preset(transport.as_ref(), &settings)?;
            println!(
                "Applied mode {} (color {}, brightness {}, speed {})",
                settings.mode, settings.color, settings.brightness, settings.speed
            );
        }
        Commands::Custom { frame } => {
            let frame = profile::load_frame(frame)?;
            let transport = cli.transport(None)?;
            let report = rgbctl_core::apply_custom_mode(transport.as_ref(), &frame)?;
            print_upload_report(&report);
        }
        Commands::Apply { profile: path } => {
            let loaded = profile::load_profile(path)?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            let transport = cli.transport(loaded.device)?;
            match loaded.apply(transport.as_ref(), base)? {
                Applied::Preset => println!("Applied profile '{}'", loaded.name),
                Applied::Custom(report) => {
                    println!("Applied profile '{}'", loaded.name);
                    print_upload_report(&report);
                }
            }
        }
        Commands::SaveProfile { path, name, preset } => {
            let device = match (cli.vid, cli.pid) {
                (None, None) => None,
                _ => Some(cli.selector(None)?),
            };
            let saved = Profile {
                name: name.clone(),
                device,
                effect: Effect::Preset(preset.settings()?),
            };
            profile::save_profile(path, &saved)?;
            println!("Profile saved to {}", path.display());
        }
        Commands::Header {
            kind,
            mode,
            speed_length,
            brightness,
            color,
            reserved2,
        } => {
            let header =
                CommandHeader::new(*kind, *mode, *speed_length, *brightness, *color, *reserved2);
            println!("{}", hex(&header.encode()));
        }
    }

    Ok(())
}
