//! Synth settings.
//!
//! `SynthConfig` is built once on the control side, validated, and then used
//! to construct the voice pool and controller. Nothing here is read from the
//! render path after start-up; runtime changes travel as
//! [`ControlMessage`](crate::synth::message::ControlMessage)s instead.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How key presses are mapped onto voices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Each new note gets its own voice group
    #[default]
    Poly,
    /// One fixed voice group, envelope restarts on every new note
    Mono,
    /// One fixed voice group, already-sounding voices change pitch without restart
    Legato,
}

impl KeyMode {
    /// Cycle Poly → Mono → Legato → Poly.
    pub fn next(self) -> Self {
        match self {
            KeyMode::Poly => KeyMode::Mono,
            KeyMode::Mono => KeyMode::Legato,
            KeyMode::Legato => KeyMode::Poly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyMode::Poly => "poly",
            KeyMode::Mono => "mono",
            KeyMode::Legato => "legato",
        }
    }
}

/// Amplitude envelope shared by every voice (seconds, sustain 0.0-1.0).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeConfig {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Frequency of A4 in Hz
    pub tuning: f32,
    /// Number of voices in the fixed pool
    pub pool_size: usize,
    /// Maximum number of simultaneously held logical notes in poly mode
    pub poly_count: usize,
    /// Voices stacked on each logical note
    pub unison_count: usize,
    pub key_mode: KeyMode,
    /// Total detune spread across a unison group, in cents
    pub unison_detune_cents: f32,
    pub envelope: EnvelopeConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            tuning: 440.0,
            pool_size: 16,
            poly_count: 16,
            unison_count: 1,
            key_mode: KeyMode::Poly,
            unison_detune_cents: 12.0,
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl SynthConfig {
    pub fn with_tuning(mut self, tuning: f32) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the pool size. Poly count follows it unless set explicitly afterwards.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self.poly_count = pool_size;
        self
    }

    pub fn with_poly_count(mut self, poly_count: usize) -> Self {
        self.poly_count = poly_count;
        self
    }

    pub fn with_unison(mut self, unison_count: usize) -> Self {
        self.unison_count = unison_count;
        self
    }

    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        self.unison_detune_cents = cents;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }

    /// Check the invariants the controller relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.tuning.is_finite() || self.tuning <= 0.0 {
            return Err(Error::InvalidTuning(self.tuning));
        }
        if self.pool_size == 0 {
            return Err(Error::EmptyPool);
        }
        if self.poly_count == 0 || self.poly_count > self.pool_size {
            return Err(Error::PolyCountOutOfRange {
                poly_count: self.poly_count,
                pool_size: self.pool_size,
            });
        }
        if self.unison_count == 0 || self.unison_count > self.pool_size {
            return Err(Error::UnisonOutOfRange {
                unison_count: self.unison_count,
                pool_size: self.pool_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SynthConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_pool_is_rejected() {
        let config = SynthConfig::default().with_pool_size(0);
        assert!(matches!(config.validate(), Err(Error::EmptyPool)));
    }

    #[test]
    fn poly_count_above_pool_is_rejected() {
        let config = SynthConfig::default().with_pool_size(4).with_poly_count(5);
        assert!(matches!(
            config.validate(),
            Err(Error::PolyCountOutOfRange {
                poly_count: 5,
                pool_size: 4
            })
        ));
    }

    #[test]
    fn unison_larger_than_pool_is_rejected() {
        let config = SynthConfig::default().with_pool_size(2).with_unison(3);
        assert!(matches!(
            config.validate(),
            Err(Error::UnisonOutOfRange { .. })
        ));
    }

    #[test]
    fn non_positive_tuning_is_rejected() {
        let config = SynthConfig::default().with_tuning(0.0);
        assert!(matches!(config.validate(), Err(Error::InvalidTuning(_))));
    }

    #[test]
    fn key_mode_cycles_through_all_modes() {
        let mode = KeyMode::Poly;
        assert_eq!(mode.next(), KeyMode::Mono);
        assert_eq!(mode.next().next(), KeyMode::Legato);
        assert_eq!(mode.next().next().next(), KeyMode::Poly);
    }
}
