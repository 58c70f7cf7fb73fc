//! Low-level DSP used by the bundled voice.
//!
//! Allocation-free once built, so both are safe to embed in voices that run
//! on the render path.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Tuning tables and the shared wavetable.
pub mod waveform;

pub use envelope::{Envelope, EnvelopeStage};
pub use waveform::Waveform;
