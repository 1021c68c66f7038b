//! Input device enumeration via the cpal default host.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use speech_capture_core::models::audio_models::AudioSource;
use speech_capture_core::models::error::CaptureError;

/// Lists and resolves input devices on the default host.
///
/// cpal exposes no stable device identifier, so the device name doubles as
/// its ID.
pub struct DeviceEnumerator {
    host: Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// All input devices, with the system default flagged.
    pub fn list_input_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        let default_name = self.host.default_input_device().and_then(|d| d.name().ok());
        let devices = self.host.input_devices().map_err(|e| {
            log::warn!("Failed to enumerate input devices: {}", e);
            CaptureError::DeviceNotAvailable
        })?;

        Ok(devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioSource {
                is_default: default_name.as_deref() == Some(name.as_str()),
                id: name.clone(),
                name,
            })
            .collect())
    }

    pub fn default_input(&self) -> Option<AudioSource> {
        let name = self.host.default_input_device()?.name().ok()?;
        Some(AudioSource {
            id: name.clone(),
            name,
            is_default: true,
        })
    }

    /// Resolve a device by ID, or the default input when `id` is None.
    pub fn resolve(&self, id: Option<&str>) -> Result<Device, CaptureError> {
        let Some(id) = id else {
            return self
                .host
                .default_input_device()
                .ok_or(CaptureError::DeviceNotAvailable);
        };

        let mut devices = self.host.input_devices().map_err(|e| {
            log::warn!("Failed to enumerate input devices: {}", e);
            CaptureError::DeviceNotAvailable
        })?;
        devices
            .find(|d| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or(CaptureError::DeviceNotAvailable)
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
