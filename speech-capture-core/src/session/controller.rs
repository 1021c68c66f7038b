use std::sync::{Arc, Weak};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::{AudioFrame, AudioSource, CaptureSessionDiagnostics};
use crate::models::config::CaptureConfiguration;
use crate::models::encoded_audio::{EncodedAudio, RecordingMetadata, SessionOutcome};
use crate::models::error::CaptureError;
use crate::models::requirements::AudioRequirements;
use crate::models::state::CaptureState;
use crate::processing::sample_buffer::SampleBuffer;
use crate::processing::wav_format;
use crate::session::deadline::DeadlineTimer;
use crate::session::lease::DeviceLease;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_provider::{CaptureProvider, FrameCallback, StreamFormat};

/// Typical device delivery size at 16 kHz (10 ms), used to pre-size buffers.
const TYPICAL_FRAME_LEN: usize = 160;

/// Why a session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Requested,
    Deadline,
    Aborted,
}

/// Everything a running session owns. Only exists inside `Phase::Active`,
/// so the device lease and the mutable buffer cannot outlive that state.
struct ActiveSession {
    generation: u64,
    id: String,
    started_at: Instant,
    lease: DeviceLease,
    buffer: SampleBuffer,
    timer: DeadlineTimer,
}

enum Phase {
    Idle,
    Active(ActiveSession),
    Stopping,
    Finalized,
    Failed(CaptureError),
}

impl Phase {
    fn to_state(&self) -> CaptureState {
        match self {
            Phase::Idle => CaptureState::Idle,
            Phase::Active(session) => CaptureState::Active {
                started_at: session.started_at,
            },
            Phase::Stopping => CaptureState::Stopping,
            Phase::Finalized => CaptureState::Finalized,
            Phase::Failed(err) => CaptureState::Failed(err.clone()),
        }
    }
}

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionCore {
    phase: Phase,
    /// Set while `start()` is waiting on the provider.
    acquiring: bool,
    generation: u64,
    diagnostics: CaptureSessionDiagnostics,
}

impl SessionCore {
    fn is_settled(&self) -> bool {
        !self.acquiring && !matches!(self.phase, Phase::Stopping)
    }
}

struct Inner<P: CaptureProvider> {
    provider: P,
    config: CaptureConfiguration,
    core: Mutex<SessionCore>,
    settled: Condvar,
    delegate: Mutex<Option<Arc<dyn CaptureDelegate>>>,
    live_tx: Sender<AudioFrame>,
    live_rx: Receiver<AudioFrame>,
    outcome_tx: Sender<SessionOutcome>,
    outcome_rx: Receiver<SessionOutcome>,
}

/// Single-session microphone capture controller.
///
/// Owns the device lease and the session state machine. Frames pushed by the
/// provider are appended to the session buffer and offered to the live
/// view; on stop, deadline or drop the session is torn down through one
/// entry point and produces exactly one [`SessionOutcome`].
///
/// ```text
/// [Provider thread] ─frame─→ [SampleBuffer] ──stop──→ [WAV encoder] ─→ completions()
///                        └──→ live_frames() (evict oldest if full)
/// ```
pub struct CaptureController<P: CaptureProvider + 'static> {
    inner: Arc<Inner<P>>,
}

impl<P: CaptureProvider + 'static> CaptureController<P> {
    pub fn new(provider: P) -> Self {
        Self::build(provider, CaptureConfiguration::default())
    }

    pub fn with_config(provider: P, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self::build(provider, config))
    }

    fn build(provider: P, config: CaptureConfiguration) -> Self {
        let (live_tx, live_rx) = crossbeam_channel::bounded(config.live_frame_capacity);
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                core: Mutex::new(SessionCore {
                    phase: Phase::Idle,
                    acquiring: false,
                    generation: 0,
                    diagnostics: CaptureSessionDiagnostics::default(),
                }),
                settled: Condvar::new(),
                delegate: Mutex::new(None),
                live_tx,
                live_rx,
                outcome_tx,
                outcome_rx,
            }),
        }
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.inner.delegate.lock() = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.inner.config
    }

    /// Upload requirements matching what this controller produces.
    pub fn requirements(&self) -> AudioRequirements {
        AudioRequirements::for_config(&self.inner.config)
    }

    pub fn state(&self) -> CaptureState {
        self.inner.core.lock().phase.to_state()
    }

    pub fn diagnostics(&self) -> CaptureSessionDiagnostics {
        self.inner.core.lock().diagnostics.clone()
    }

    pub fn available_audio_sources(&self) -> Vec<AudioSource> {
        if self.inner.provider.is_available() {
            vec![self.inner.provider.device_info()]
        } else {
            Vec::new()
        }
    }

    /// Receiver for session outcomes, one per session.
    pub fn completions(&self) -> Receiver<SessionOutcome> {
        self.inner.outcome_rx.clone()
    }

    /// Receiver for live frames. Clones share one queue; when it is full the
    /// oldest queued frame is evicted, so a slow reader always catches up to
    /// the most recent frame without delaying capture.
    pub fn live_frames(&self) -> Receiver<AudioFrame> {
        self.inner.live_rx.clone()
    }

    /// Acquire the input and begin a session. Blocks until the provider has
    /// either started streaming or failed.
    pub fn start(&self) -> Result<(), CaptureError> {
        Inner::start(&self.inner)
    }

    /// End the active session, if any. The result arrives on
    /// [`completions`](Self::completions).
    pub fn stop(&self) {
        if let Some(generation) = self.inner.active_generation() {
            self.inner.teardown(generation, StopReason::Requested);
        }
    }
}

impl<P: CaptureProvider + 'static> Drop for CaptureController<P> {
    fn drop(&mut self) {
        if let Some(generation) = self.inner.active_generation() {
            log::warn!("Capture controller dropped mid-session, aborting");
            self.inner.teardown(generation, StopReason::Aborted);
        }
        // A deadline teardown may still be running on the timer thread.
        let mut core = self.inner.core.lock();
        while !core.is_settled() {
            self.inner.settled.wait(&mut core);
        }
    }
}

impl<P: CaptureProvider + 'static> Inner<P> {
    fn start(this: &Arc<Self>) -> Result<(), CaptureError> {
        let generation = {
            let mut core = this.core.lock();
            if core.acquiring || matches!(core.phase, Phase::Active(_) | Phase::Stopping) {
                return Err(CaptureError::AlreadyActive);
            }
            core.acquiring = true;
            core.generation += 1;
            core.diagnostics = CaptureSessionDiagnostics::default();
            core.generation
        };
        // Unread frames from the previous session.
        while this.live_rx.try_recv().is_ok() {}

        let session_id = uuid::Uuid::new_v4().to_string();
        let format = StreamFormat {
            sample_rate: this.config.sample_rate,
            channels: this.config.channels,
            device_id: this.config.device_id.clone(),
        };

        let handle = match this.provider.acquire(&format, Self::frame_callback(this, generation)) {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("Input acquisition failed: {}", err);
                this.fail_start(err.clone());
                return Err(err);
            }
        };
        let lease = DeviceLease::new(handle, session_id.clone());

        let started_at = Instant::now();
        let deadline = started_at + this.config.max_duration;
        let weak = Arc::downgrade(this);
        let armed = {
            let mut core = this.core.lock();
            // Armed under the lock so the deadline cannot fire before the
            // session is visible as active.
            let timer = DeadlineTimer::arm(deadline, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.teardown(generation, StopReason::Deadline);
                }
            });
            match timer {
                Ok(timer) => {
                    core.acquiring = false;
                    core.phase = Phase::Active(ActiveSession {
                        generation,
                        id: session_id.clone(),
                        started_at,
                        lease,
                        buffer: SampleBuffer::with_capacity(
                            this.config.sample_rate as usize * this.config.max_duration.as_secs().max(1) as usize,
                            TYPICAL_FRAME_LEN,
                        ),
                        timer,
                    });
                    Ok(())
                }
                Err(err) => Err((err, lease)),
            }
        };

        if let Err((err, lease)) = armed {
            lease.release();
            log::warn!("Could not arm session deadline: {}", err);
            this.fail_start(err.clone());
            return Err(err);
        }

        log::info!(
            "Capture session {} started ({} Hz, auto-stop after {:?})",
            session_id,
            this.config.sample_rate,
            this.config.max_duration
        );
        this.notify_state(CaptureState::Active { started_at });
        Ok(())
    }

    fn fail_start(&self, err: CaptureError) {
        {
            let mut core = self.core.lock();
            core.acquiring = false;
            core.phase = Phase::Failed(err.clone());
        }
        self.settled.notify_all();
        self.notify_state(CaptureState::Failed(err.clone()));
        self.emit(SessionOutcome::Failed(err));
    }

    fn frame_callback(this: &Arc<Self>, generation: u64) -> FrameCallback {
        let weak: Weak<Self> = Arc::downgrade(this);
        Arc::new(move |samples: &[f32]| {
            if let Some(inner) = weak.upgrade() {
                inner.on_frame(generation, samples);
            }
        })
    }

    fn on_frame(&self, generation: u64, samples: &[f32]) {
        let frame = AudioFrame::new(samples);
        {
            let mut guard = self.core.lock();
            let core = &mut *guard;
            core.diagnostics.frames_delivered += 1;
            match &mut core.phase {
                Phase::Active(session) if session.generation == generation => {
                    session.buffer.append(frame.clone());
                    core.diagnostics.frames_buffered += 1;
                    core.diagnostics.samples_buffered += frame.len() as u64;
                }
                _ => {
                    core.diagnostics.frames_dropped_inactive += 1;
                    log::debug!("Dropping frame of {} samples outside an active session", frame.len());
                    return;
                }
            }
        }

        let frame = match self.live_tx.try_send(frame) {
            Err(TrySendError::Full(frame)) => frame,
            Ok(()) | Err(TrySendError::Disconnected(_)) => return,
        };
        // Full: evict the oldest so the queue always ends with the newest frame.
        let mut dropped = u64::from(self.live_rx.try_recv().is_ok());
        if self.live_tx.try_send(frame).is_err() {
            dropped += 1;
        }
        if dropped > 0 {
            self.core.lock().diagnostics.live_frames_dropped += dropped;
        }
    }

    fn active_generation(&self) -> Option<u64> {
        match &self.core.lock().phase {
            Phase::Active(session) => Some(session.generation),
            _ => None,
        }
    }

    /// The one teardown path. Only the first caller for a given session gets
    /// past the `Active → Stopping` swap; every later caller returns at once.
    fn teardown(&self, generation: u64, reason: StopReason) {
        let session = {
            let mut core = self.core.lock();
            match std::mem::replace(&mut core.phase, Phase::Stopping) {
                Phase::Active(session) if session.generation == generation => session,
                other => {
                    core.phase = other;
                    return;
                }
            }
        };
        log::debug!("Stopping session {} ({:?})", session.id, reason);
        self.notify_state(CaptureState::Stopping);

        let ActiveSession {
            id,
            lease,
            buffer,
            timer,
            ..
        } = session;
        timer.disarm();
        lease.release();

        let outcome = match reason {
            StopReason::Aborted => SessionOutcome::Failed(CaptureError::Aborted),
            StopReason::Requested | StopReason::Deadline => {
                SessionOutcome::Completed(self.encode(&id, &buffer))
            }
        };

        let final_state = {
            let mut core = self.core.lock();
            core.phase = match &outcome {
                SessionOutcome::Completed(_) => Phase::Finalized,
                SessionOutcome::Failed(err) => Phase::Failed(err.clone()),
            };
            core.phase.to_state()
        };
        self.settled.notify_all();

        match &outcome {
            SessionOutcome::Completed(audio) => log::info!(
                "Capture session {} finished: {} samples, {} bytes",
                id,
                audio.metadata.sample_count,
                audio.bytes.len()
            ),
            SessionOutcome::Failed(err) => log::warn!("Capture session {} ended: {}", id, err),
        }

        self.notify_state(final_state);
        self.emit(outcome);
    }

    fn encode(&self, session_id: &str, buffer: &SampleBuffer) -> EncodedAudio {
        let sample_rate = self.config.sample_rate;
        let bytes = wav_format::encode_buffer(buffer, sample_rate);
        let metadata = RecordingMetadata::for_payload(session_id, &bytes, buffer.sample_count() as u64, sample_rate);
        EncodedAudio {
            bytes,
            sample_rate,
            channels: wav_format::CHANNELS,
            bits_per_sample: wav_format::BITS_PER_SAMPLE,
            metadata,
        }
    }

    fn delegate(&self) -> Option<Arc<dyn CaptureDelegate>> {
        self.delegate.lock().clone()
    }

    fn notify_state(&self, state: CaptureState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(&state);
        }
    }

    fn emit(&self, outcome: SessionOutcome) {
        if let Some(delegate) = self.delegate() {
            delegate.on_session_finished(&outcome);
        }
        // Inner holds a receiver, so the channel never disconnects.
        let _ = self.outcome_tx.send(outcome);
    }
}
