//! Wavetable voice.
//!
//! A sawtooth read from the shared [`Waveform`] table, shaped by a linear
//! ADSR. Unison siblings are spread evenly across the configured detune range
//! and start at staggered phases so a stack does not sum into one louder saw.
//!
//! # How It Works
//!
//! 1. `trigger` restarts the envelope (and the oscillator phase)
//! 2. `set_note` only retunes, which is what legato relies on
//! 3. `release` starts the envelope's release; the voice reports playing
//!    until the envelope reaches idle

use std::sync::Arc;

use crate::{
    config::{EnvelopeConfig, SynthConfig},
    dsp::{Envelope, Waveform},
    synth::voice::{UnisonInfo, Voice},
};

/// Per-voice output level, leaves headroom for a full chord.
const VOICE_GAIN: f32 = 0.25;

pub struct WaveVoice {
    index: usize,
    note: u8,
    velocity: u8,
    key_on: bool,
    playing: bool,
    unison: UnisonInfo,

    waveform: Arc<Waveform>,
    envelope: Envelope,
    phase: f32,
    /// Total unison spread in cents
    detune_spread: f32,
    /// Pitch ratio of this voice within its unison group
    detune_ratio: f32,
    /// Level compensation for the unison group size
    unison_gain: f32,
}

impl WaveVoice {
    pub fn new(
        index: usize,
        waveform: Arc<Waveform>,
        envelope: EnvelopeConfig,
        detune_spread: f32,
    ) -> Self {
        let envelope = Envelope::new(envelope, waveform.sample_rate());
        Self {
            index,
            note: 0,
            velocity: 0,
            key_on: false,
            playing: false,
            unison: UnisonInfo::new(index, 1, 0),
            waveform,
            envelope,
            phase: 0.0,
            detune_spread,
            detune_ratio: 1.0,
            unison_gain: 1.0,
        }
    }

    /// Factory building identical voices around one shared waveform.
    pub fn factory(waveform: Arc<Waveform>, config: &SynthConfig) -> impl Fn(usize) -> WaveVoice {
        let envelope = config.envelope;
        let detune = config.unison_detune_cents;
        move |index| WaveVoice::new(index, Arc::clone(&waveform), envelope, detune)
    }

    /// Detune in cents for this voice's unison role, -spread/2 ..= +spread/2.
    fn detune_cents(&self) -> f32 {
        if self.unison.size <= 1 {
            return 0.0;
        }
        let normalized = self.unison.role as f32 / (self.unison.size - 1) as f32;
        (normalized - 0.5) * self.detune_spread
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }
}

impl Voice for WaveVoice {
    fn index(&self) -> usize {
        self.index
    }

    fn note(&self) -> u8 {
        self.note
    }

    fn velocity(&self) -> u8 {
        self.velocity
    }

    fn is_key_on(&self) -> bool {
        self.key_on
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_note(&mut self, note: u8, velocity: u8) {
        self.note = note;
        self.velocity = velocity;
    }

    fn trigger(&mut self, note: u8, velocity: u8) {
        self.set_note(note, velocity);
        self.key_on = true;
        self.playing = true;
        self.phase = if self.unison.size > 1 {
            self.unison.role as f32 / self.unison.size as f32
        } else {
            0.0
        };
        self.envelope.note_on();
    }

    fn release(&mut self) {
        self.key_on = false;
        self.envelope.note_off();
    }

    fn set_unison(&mut self, unison: UnisonInfo) {
        self.unison = unison;
        self.detune_ratio = 2.0_f32.powf(self.detune_cents() / 1200.0);
        self.unison_gain = 1.0 / (unison.size.max(1) as f32).sqrt();
    }

    fn unison(&self) -> UnisonInfo {
        self.unison
    }

    fn next_sample(&mut self) -> f32 {
        let level = self.envelope.next_sample();
        if !self.envelope.is_active() {
            self.playing = false;
            return 0.0;
        }

        let amp = level * (self.velocity as f32 / 127.0) * self.unison_gain * VOICE_GAIN;
        let out = self.waveform.sample(self.phase) * amp;

        self.phase += self.waveform.increment(self.note) * self.detune_ratio;
        self.phase -= self.phase.floor();
        out
    }
}
