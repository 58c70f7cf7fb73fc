//! Ready-to-use [`Voice`](crate::synth::voice::Voice) implementations.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keysynth::{dsp::Waveform, synth::VoiceController, voices::WaveVoice, SynthConfig};
//!
//! let config = SynthConfig::default();
//! let waveform = Arc::new(Waveform::build(config.tuning, 48_000.0));
//! let controller = VoiceController::from_config(&config, &WaveVoice::factory(waveform, &config));
//! ```

mod wave;

pub use wave::WaveVoice;
