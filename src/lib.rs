pub mod config; // Synth settings and key modes
pub mod dsp;
pub mod error;
pub mod io;
pub mod keys; // Shared key-state table
pub mod synth; // Voice allocation, triggering and the render callback
pub mod voices;

pub use config::{EnvelopeConfig, KeyMode, SynthConfig};
pub use error::{Error, Result};

/// Number of MIDI note numbers tracked by the key table.
pub const NOTE_COUNT: usize = 128;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
