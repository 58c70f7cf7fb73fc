//! Audio output.
//!
//! A sink pulls one sample at a time from whatever [`SignalSource`] is
//! registered in its [`SignalSlot`]. The slot is the only thing shared with
//! the device's render thread:
//!
//! - the render side only ever `try_lock`s it and plays silence when the lock
//!   is contended, so it never blocks;
//! - the control side locks it to swap the source in or out, so once
//!   [`SignalSlot::clear`] returns no render call is in flight and none will
//!   reach the old source again.
//!
//! That makes "unregister, then destroy" a plain sequence: take the source
//! back out of the sink, then drop it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, TryLockError,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};

use crate::error::{Error, Result};

/// Produces one output sample per call, on the render path.
pub trait SignalSource: Send {
    fn next_sample(&mut self) -> f32;
}

impl<F> SignalSource for F
where
    F: FnMut() -> f32 + Send,
{
    fn next_sample(&mut self) -> f32 {
        self()
    }
}

/// Destination for rendered audio.
pub trait AudioSink {
    fn sample_rate(&self) -> f32;

    /// Register the source the render path pulls from, replacing any other.
    fn set_signal_source(&mut self, source: Box<dyn SignalSource>);

    /// Unregister the current source and hand it back. When this returns the
    /// render path is no longer inside the source and will not call it again.
    fn clear_signal_source(&mut self) -> Option<Box<dyn SignalSource>>;

    fn start(&mut self) -> Result<()>;
}

/// Shared, swappable home of the registered source.
#[derive(Clone, Default)]
pub struct SignalSlot {
    inner: Arc<Mutex<Option<Box<dyn SignalSource>>>>,
    /// Mirrors `inner.is_some()`, written under the lock
    installed: Arc<AtomicBool>,
}

impl SignalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control side. Returns the previously registered source.
    pub fn set(&self, source: Box<dyn SignalSource>) -> Option<Box<dyn SignalSource>> {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        self.installed.store(true, Ordering::Release);
        slot.replace(source)
    }

    /// Control side. Waits for an in-flight render call to finish.
    pub fn clear(&self) -> Option<Box<dyn SignalSource>> {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        self.installed.store(false, Ordering::Release);
        slot.take()
    }

    /// Whether a source is registered. Reads a flag and never touches the
    /// lock, so polling it cannot make the render side skip a buffer.
    pub fn is_set(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Render side. Fills interleaved `data`, one source sample per frame
    /// copied to every channel. Plays silence when no source is registered
    /// or the slot is being swapped.
    pub fn render(&self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                data.fill(0.0);
                return;
            }
        };

        match guard.as_mut() {
            Some(source) => {
                for frame in data.chunks_mut(channels) {
                    let sample = source.next_sample();
                    frame.fill(sample);
                }
            }
            None => data.fill(0.0),
        }
    }
}

/// Sink driven by the caller instead of a device: tests, offline rendering,
/// and anywhere a deterministic render loop is wanted.
pub struct ManualSink {
    sample_rate: f32,
    slot: SignalSlot,
}

impl ManualSink {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            slot: SignalSlot::new(),
        }
    }

    /// Handle for rendering from another thread.
    pub fn slot(&self) -> SignalSlot {
        self.slot.clone()
    }

    /// Render mono samples into `out`.
    pub fn render(&self, out: &mut [f32]) {
        self.slot.render(out, 1);
    }
}

impl AudioSink for ManualSink {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn set_signal_source(&mut self, source: Box<dyn SignalSource>) {
        self.slot.set(source);
    }

    fn clear_signal_source(&mut self) -> Option<Box<dyn SignalSource>> {
        self.slot.clear()
    }

    fn start(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Default output device via cpal.
pub struct CpalSink {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    slot: SignalSlot,
    stream: Option<cpal::Stream>,
}

impl CpalSink {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;
        let config = device.default_output_config()?;

        Ok(Self {
            device,
            config,
            slot: SignalSlot::new(),
            stream: None,
        })
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }
}

impl AudioSink for CpalSink {
    fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    fn set_signal_source(&mut self, source: Box<dyn SignalSource>) {
        self.slot.set(source);
    }

    fn clear_signal_source(&mut self) -> Option<Box<dyn SignalSource>> {
        self.slot.clear()
    }

    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let channels = self.channels();
        let slot = self.slot.clone();
        let stream = self.device.build_output_stream(
            &self.config.clone().into(),
            move |data: &mut [f32], _| slot.render(data, channels),
            |err| error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        info!(
            "audio started on {} ({} Hz, {} channels)",
            self.device_name(),
            self.sample_rate(),
            channels
        );
        self.stream = Some(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_renders_silence() {
        let sink = ManualSink::new(48_000.0);
        let mut out = [1.0f32; 8];
        sink.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn source_fills_every_channel_of_a_frame() {
        let slot = SignalSlot::new();
        let mut n = 0.0;
        slot.set(Box::new(move || {
            n += 1.0;
            n
        }));

        let mut data = [0.0f32; 6];
        slot.render(&mut data, 2);
        assert_eq!(data, [1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn clear_hands_the_source_back() {
        let mut sink = ManualSink::new(48_000.0);
        sink.set_signal_source(Box::new(|| 0.5));
        assert!(sink.slot().is_set());

        let mut source = sink.clear_signal_source().expect("source was registered");
        assert_eq!(source.next_sample(), 0.5);
        assert!(!sink.slot().is_set());
        assert!(sink.clear_signal_source().is_none());
    }

    #[test]
    fn is_set_does_not_contend_with_rendering() {
        let slot = SignalSlot::new();
        let observer = slot.clone();
        // Queried from inside the render call, while the slot lock is held
        slot.set(Box::new(move || if observer.is_set() { 1.0 } else { -1.0 }));

        let mut data = [0.0f32; 4];
        slot.render(&mut data, 1);
        assert_eq!(data, [1.0; 4]);

        // Break the slot -> source -> slot cycle
        assert!(slot.clear().is_some());
        assert!(!slot.is_set());
    }
}
