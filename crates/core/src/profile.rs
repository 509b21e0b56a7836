//! Lighting profiles stored as JSON.
//!
//! A profile names the device to talk to (optional, CLI flags win) and the
//! effect to apply:
//!
//! ```json
//! {
//!   "name": "Desk",
//!   "device": { "vid": 4660, "pid": 22136, "interface": 3 },
//!   "effect": { "type": "preset", "mode": 2, "color": 1, "brightness": 25, "speed": 3 }
//! }
//! ```
//!
//! Custom effects reference a 512-byte binary frame file; relative paths are
//! resolved against the profile's directory.

use crate::custom::{apply_custom_mode, UploadReport};
use crate::device::{Color, CustomFrame, DeviceSelector, Mode};
use crate::error::{Error, Result};
use crate::preset::{apply_preset, PresetSettings};
use crate::safety;
use crate::transport::UsbTransport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A saved lighting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile display name.
    pub name: String,
    /// Device to apply the profile to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceSelector>,
    pub effect: Effect,
}

/// What a profile applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Preset(PresetSettings),
    Custom { frame: PathBuf },
}

/// Result of applying a profile.
#[derive(Debug)]
pub enum Applied {
    Preset,
    Custom(UploadReport),
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Default".into(),
            device: None,
            effect: Effect::Preset(PresetSettings {
                mode: Mode::BREATHING,
                color: Color::RED,
                brightness: 25,
                speed: 3,
            }),
        }
    }
}

impl Profile {
    /// Check values the device would silently clamp or reject.
    pub fn validate(&self) -> Result<()> {
        if let Effect::Preset(settings) = &self.effect {
            safety::validate_brightness(settings.brightness)?;
        }
        Ok(())
    }

    /// Apply the profile's effect. `base` resolves relative frame paths.
    pub fn apply(&self, transport: &dyn UsbTransport, base: &Path) -> Result<Applied> {
        match &self.effect {
            Effect::Preset(settings) => {
                apply_preset(transport, settings)?;
                Ok(Applied::Preset)
            }
            Effect::Custom { frame } => {
                let frame = load_frame(&base.join(frame))?;
                Ok(Applied::Custom(apply_custom_mode(transport, &frame)?))
            }
        }
    }
}

/// Load and validate a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::Profile(format!("read {}: {e}", path.display())))?;
    let profile: Profile = serde_json::from_str(&data)
        .map_err(|e| Error::Profile(format!("parse {}: {e}", path.display())))?;
    profile.validate()?;
    debug!(name = %profile.name, path = %path.display(), "Profile loaded");
    Ok(profile)
}

/// Validate and write a profile as pretty-printed JSON.
pub fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    profile.validate()?;
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| Error::Profile(format!("serialize: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| Error::Profile(format!("write {}: {e}", path.display())))?;
    debug!(name = %profile.name, path = %path.display(), "Profile saved");
    Ok(())
}

/// Read a raw 512-byte custom frame file.
pub fn load_frame(path: &Path) -> Result<CustomFrame> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Profile(format!("read frame {}: {e}", path.display())))?;
    CustomFrame::from_slice(&data)
}
