//! cpal microphone capture provider.
//!
//! Opens an input stream on a dedicated thread (cpal streams are not `Send`
//! on every platform), converts each delivery to mono at the requested rate
//! and hands it to the core's `FrameCallback`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, SupportedStreamConfig};
use crossbeam_channel::{Receiver, Sender};

use speech_capture_core::models::audio_models::AudioSource;
use speech_capture_core::models::error::CaptureError;
use speech_capture_core::traits::capture_provider::{CaptureProvider, DeviceHandle, FrameCallback, StreamFormat};

use crate::converter::FrameConverter;
use crate::device_enumerator::DeviceEnumerator;

/// Microphone capture through the platform's default cpal host.
pub struct CpalMicCapture {
    device_id: Option<String>,
}

impl CpalMicCapture {
    /// Capture from the system default microphone (or the device named in
    /// the session's `StreamFormat`).
    pub fn default_device() -> Self {
        Self { device_id: None }
    }

    /// Capture from a specific microphone by device ID.
    pub fn with_device(id: String) -> Self {
        Self { device_id: Some(id) }
    }
}

impl CaptureProvider for CpalMicCapture {
    fn is_available(&self) -> bool {
        DeviceEnumerator::new().resolve(self.device_id.as_deref()).is_ok()
    }

    fn acquire(&self, format: &StreamFormat, callback: FrameCallback) -> Result<Box<dyn DeviceHandle>, CaptureError> {
        let device_id = format.device_id.clone().or_else(|| self.device_id.clone());
        let target_rate = format.sample_rate;

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), CaptureError>>(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let delivering = Arc::new(AtomicBool::new(true));
        let gate = Arc::clone(&delivering);

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || capture_thread(device_id, target_rate, callback, gate, ready_tx, stop_rx))
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to spawn mic thread: {}", e)))?;

        // The thread exits on its own when acquisition fails.
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalDeviceHandle {
                stop: Some(stop_tx),
                delivering,
                thread: Some(handle),
            })),
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::DeviceNotAvailable)
            }
        }
    }

    fn device_info(&self) -> AudioSource {
        let enumerator = DeviceEnumerator::new();
        match &self.device_id {
            Some(id) => AudioSource {
                id: id.clone(),
                name: id.clone(),
                is_default: false,
            },
            None => enumerator.default_input().unwrap_or_else(|| AudioSource {
                id: "default-mic".into(),
                name: "Default Microphone".into(),
                is_default: true,
            }),
        }
    }
}

/// A running cpal stream. Releasing closes the gate, drops the stream on its
/// own thread and joins it.
struct CpalDeviceHandle {
    stop: Option<Sender<()>>,
    delivering: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl DeviceHandle for CpalDeviceHandle {
    fn release(mut self: Box<Self>) {
        self.delivering.store(false, Ordering::SeqCst);
        self.stop.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("cpal capture thread panicked");
            }
        }
    }
}

/// Stream owner. Sequence:
/// 1. Resolve device (default or by ID)
/// 2. Pick a config, preferring one that supports the target rate natively
/// 3. Build and start the input stream
/// 4. Report readiness, then park until released
fn capture_thread(
    device_id: Option<String>,
    target_rate: u32,
    callback: FrameCallback,
    delivering: Arc<AtomicBool>,
    ready: Sender<Result<(), CaptureError>>,
    stop: Receiver<()>,
) {
    let stream = match open_stream(device_id.as_deref(), target_rate, callback, delivering) {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        return;
    }

    // Blocks until the handle drops its sender.
    let _ = stop.recv();
    drop(stream);
    log::debug!("cpal input stream closed");
}

fn open_stream(
    device_id: Option<&str>,
    target_rate: u32,
    callback: FrameCallback,
    delivering: Arc<AtomicBool>,
) -> Result<Stream, CaptureError> {
    let device = DeviceEnumerator::new().resolve(device_id)?;
    log::info!("Using audio input device: {:?}", device.name());

    let config = select_config(&device, target_rate)?;
    log::info!(
        "Audio config: {} Hz, {} channels, {:?}",
        config.sample_rate().0,
        config.channels(),
        config.sample_format()
    );

    let converter = FrameConverter::new(config.sample_rate().0, config.channels(), target_rate);
    let stream = match config.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, converter, callback, delivering),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, converter, callback, delivering),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, converter, callback, delivering),
        other => {
            log::warn!("Unsupported input sample format {:?}", other);
            return Err(CaptureError::DeviceNotAvailable);
        }
    }?;

    stream.play().map_err(|e| {
        log::warn!("Failed to start input stream: {}", e);
        CaptureError::DeviceNotAvailable
    })?;
    Ok(stream)
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

/// Prefer a config that runs at `target_rate` with the fewest channels;
/// otherwise fall back to the device default and resample.
fn select_config(device: &Device, target_rate: u32) -> Result<SupportedStreamConfig, CaptureError> {
    let native = device
        .supported_input_configs()
        .map(|ranges| {
            ranges
                .filter(|r| is_supported_format(r.sample_format()))
                .filter(|r| r.min_sample_rate().0 <= target_rate && target_rate <= r.max_sample_rate().0)
                .min_by_key(|r| r.channels())
        })
        .ok()
        .flatten();

    if let Some(range) = native {
        return Ok(range.with_sample_rate(SampleRate(target_rate)));
    }

    device.default_input_config().map_err(|e| {
        log::warn!("No usable input configuration: {}", e);
        CaptureError::DeviceNotAvailable
    })
}

fn build_stream<T>(
    device: &Device,
    config: &SupportedStreamConfig,
    mut converter: FrameConverter,
    callback: FrameCallback,
    delivering: Arc<AtomicBool>,
) -> Result<Stream, CaptureError>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device
        .build_input_stream(
            &config.config(),
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !delivering.load(Ordering::SeqCst) {
                    return;
                }
                scratch.clear();
                scratch.extend(data.iter().map(|&s| <f32 as cpal::Sample>::from_sample(s)));
                let frame = converter.convert(&scratch);
                if !frame.is_empty() {
                    callback(&frame);
                }
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| {
            log::warn!("Failed to build input stream: {}", e);
            CaptureError::DeviceNotAvailable
        })
}
