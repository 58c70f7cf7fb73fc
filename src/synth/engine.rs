//! The per-sample callback and its wiring.
//!
//! [`Synth`] is the render-side object: it owns the voice controller and is
//! moved into the audio sink as its signal source. [`Synth::create`] builds
//! one from a [`SynthConfig`] and registers it; the returned [`SynthHandle`]
//! stays on the control side and is the only way to talk to it afterwards.
//!
//! Teardown is [`SynthHandle::destroy`]: unregister from the sink first,
//! which waits out any in-flight callback, then drop the synth.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::SynthConfig,
    dsp::Waveform,
    error::Result,
    io::{AudioSink, DisplaySink, SignalSource},
    keys::KeyState,
    voices::WaveVoice,
};

use super::{
    controller::VoiceController,
    message::{ControlMessage, MessageReceiver},
    snapshot::{VoiceSnapshot, SNAPSHOT_INTERVAL},
    voice::Voice,
};

/// Capacity of the control → render message ring.
const CONTROL_RING: usize = 64;
/// Capacity of the render → display snapshot ring.
const SNAPSHOT_RING: usize = 16;

pub struct Synth<V, K, D> {
    controller: VoiceController<V>,
    keys: K,
    display: D,
    control_rx: Option<Consumer<ControlMessage>>,
    snapshot_tx: Option<Producer<VoiceSnapshot>>,
    timing: bool,
    process_time: Duration,
    peak_process_time: Duration,
    samples_until_snapshot: usize,
}

impl<V, K, D> Synth<V, K, D>
where
    V: Voice,
    K: KeyState,
    D: DisplaySink,
{
    pub fn new(controller: VoiceController<V>, keys: K, display: D) -> Self {
        Self {
            controller,
            keys,
            display,
            control_rx: None,
            snapshot_tx: None,
            timing: false,
            process_time: Duration::ZERO,
            peak_process_time: Duration::ZERO,
            samples_until_snapshot: 0,
        }
    }

    pub fn with_control(mut self, control_rx: Consumer<ControlMessage>) -> Self {
        self.control_rx = Some(control_rx);
        self
    }

    pub fn with_snapshots(mut self, snapshot_tx: Producer<VoiceSnapshot>) -> Self {
        self.snapshot_tx = Some(snapshot_tx);
        self
    }

    /// Measure how long each callback takes. Diagnostic only.
    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.timing = enabled;
        self
    }

    /// Produce one output sample. Called once per sample on the render path.
    pub fn signal_callback(&mut self) -> f32 {
        let start = self.timing.then(Instant::now);

        self.apply_control();

        if self.keys.has_changed() {
            self.controller.trigger(&self.keys);
            self.keys.acknowledge_change();
        }

        let value = self.controller.signal_process();
        self.display.push_sample(value);

        if let Some(start) = start {
            self.process_time = start.elapsed();
            self.peak_process_time = self.peak_process_time.max(self.process_time);
        }
        self.publish_snapshot();

        value
    }

    fn apply_control(&mut self) {
        let Some(rx) = self.control_rx.as_mut() else {
            return;
        };
        while let Some(msg) = MessageReceiver::pop(rx) {
            match msg {
                ControlMessage::SetKeyMode(mode) => self.controller.set_key_mode(mode),
                ControlMessage::SetUnison(count) => self.controller.set_unison_count(count),
                ControlMessage::SetPolyCount(count) => self.controller.set_poly_count(count),
                ControlMessage::AllNotesOff => self.controller.all_notes_off(),
            }
        }
    }

    fn publish_snapshot(&mut self) {
        let Some(tx) = self.snapshot_tx.as_mut() else {
            return;
        };
        if self.samples_until_snapshot > 0 {
            self.samples_until_snapshot -= 1;
            return;
        }
        self.samples_until_snapshot = SNAPSHOT_INTERVAL - 1;

        let mut snapshot = VoiceSnapshot::capture(&self.controller);
        snapshot.process_time = self.process_time;
        snapshot.peak_process_time = self.peak_process_time;
        // Dropped when the display is behind
        let _ = tx.push(snapshot);
        self.peak_process_time = Duration::ZERO;
    }

    pub fn controller(&self) -> &VoiceController<V> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VoiceController<V> {
        &mut self.controller
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Duration of the last callback, if timing is enabled.
    pub fn process_time(&self) -> Duration {
        self.process_time
    }
}

impl<V, K, D> SignalSource for Synth<V, K, D>
where
    V: Voice,
    K: KeyState + Send,
    D: DisplaySink,
{
    fn next_sample(&mut self) -> f32 {
        self.signal_callback()
    }
}

impl<K, D> Synth<WaveVoice, K, D>
where
    K: KeyState + Send + 'static,
    D: DisplaySink + 'static,
{
    /// Build a synth for `sink`'s sample rate and register it as the sink's
    /// signal source.
    pub fn create<S: AudioSink>(
        config: &SynthConfig,
        sink: &mut S,
        keys: K,
        display: D,
    ) -> Result<SynthHandle> {
        config.validate()?;

        let sample_rate = sink.sample_rate();
        let waveform = Arc::new(Waveform::build(config.tuning, sample_rate));
        let factory = WaveVoice::factory(waveform, config);
        let controller = VoiceController::from_config(config, &factory);

        let (control_tx, control_rx) = RingBuffer::new(CONTROL_RING);
        let (snapshot_tx, snapshots) = RingBuffer::new(SNAPSHOT_RING);

        let synth = Synth::new(controller, keys, display)
            .with_control(control_rx)
            .with_snapshots(snapshot_tx)
            .with_timing(true);
        sink.set_signal_source(Box::new(synth));

        info!(
            "synth created: {} voices, {} mode, unison {}, A4 = {} Hz @ {} Hz",
            config.pool_size,
            config.key_mode.as_str(),
            config.unison_count,
            config.tuning,
            sample_rate
        );

        Ok(SynthHandle {
            control_tx,
            snapshots,
            sample_rate,
            pool_size: config.pool_size,
        })
    }
}

/// Control-side handle to a registered [`Synth`].
pub struct SynthHandle {
    control_tx: Producer<ControlMessage>,
    snapshots: Consumer<VoiceSnapshot>,
    sample_rate: f32,
    pool_size: usize,
}

impl SynthHandle {
    /// Queue a settings change for the render path. Returns false when the
    /// queue is full and the message was dropped.
    ///
    /// Voice counts are clamped to `1..=pool size` here, before they reach
    /// the render path.
    pub fn send(&mut self, msg: ControlMessage) -> bool {
        let msg = match msg {
            ControlMessage::SetUnison(count) => {
                ControlMessage::SetUnison(self.clamp("unison", count))
            }
            ControlMessage::SetPolyCount(count) => {
                ControlMessage::SetPolyCount(self.clamp("poly count", count))
            }
            other => other,
        };
        debug!("control: {msg:?}");
        self.control_tx.push(msg).is_ok()
    }

    fn clamp(&self, what: &str, count: usize) -> usize {
        let clamped = count.clamp(1, self.pool_size.max(1));
        if clamped != count {
            warn!("{what} {count} out of range, using {clamped}");
        }
        clamped
    }

    /// Most recent snapshot published since the last call, if any.
    pub fn latest_snapshot(&mut self) -> Option<VoiceSnapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.snapshots.pop() {
            latest = Some(snapshot);
        }
        latest
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Unregister from `sink`, then drop the synth and its voices.
    pub fn destroy<S: AudioSink>(self, sink: &mut S) {
        let source = sink.clear_signal_source();
        drop(source);
        info!("synth destroyed");
    }
}
