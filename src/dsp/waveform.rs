use std::f32::consts::TAU;

use crate::NOTE_COUNT;

/// Samples per wavetable cycle.
pub const TABLE_SIZE: usize = 2048;

/// Harmonics summed into the sawtooth table.
const SAW_HARMONICS: usize = 32;

/*
Waveform Tables
===============

Built once at start-up, at the output device's sample rate, then shared
read-only by every voice:

  increments   per MIDI note, how far the phase (0.0..1.0) advances each
               sample: frequency / sample_rate. Frequencies follow equal
               temperament from the tuning reference (A4 = note 69).

  table        one cycle of a sawtooth, summed from its first harmonics so
               the low and middle register stays free of aliasing.

Voices keep their own phase and read the table with linear interpolation.
*/

pub struct Waveform {
    tuning: f32,
    sample_rate: f32,
    increments: [f32; NOTE_COUNT],
    table: Vec<f32>,
}

impl Waveform {
    pub fn build(tuning: f32, sample_rate: f32) -> Self {
        let increments = std::array::from_fn(|note| {
            note_to_freq(note as u8, tuning) / sample_rate
        });

        let mut table: Vec<f32> = (0..TABLE_SIZE)
            .map(|i| {
                let phase = i as f32 / TABLE_SIZE as f32;
                (1..=SAW_HARMONICS)
                    .map(|h| {
                        let sign = if h % 2 == 0 { -1.0 } else { 1.0 };
                        sign * (TAU * h as f32 * phase).sin() / h as f32
                    })
                    .sum::<f32>()
            })
            .collect();

        let peak = table.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        if peak > 0.0 {
            for sample in &mut table {
                *sample /= peak;
            }
        }

        Self {
            tuning,
            sample_rate,
            increments,
            table,
        }
    }

    /// Phase increment per sample for `note`; 0.0 outside the MIDI range.
    #[inline]
    pub fn increment(&self, note: u8) -> f32 {
        self.increments.get(note as usize).copied().unwrap_or(0.0)
    }

    /// Read the table at `phase` (0.0..1.0) with linear interpolation.
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        let pos = phase.rem_euclid(1.0) * TABLE_SIZE as f32;
        let idx = (pos as usize).min(TABLE_SIZE - 1);
        let frac = pos - idx as f32;
        let a = self.table[idx];
        let b = self.table[(idx + 1) % TABLE_SIZE];
        a + (b - a) * frac
    }

    pub fn tuning(&self) -> f32 {
        self.tuning
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Equal-tempered frequency of `note` with A4 (note 69) at `tuning` Hz.
#[inline]
pub fn note_to_freq(note: u8, tuning: f32) -> f32 {
    tuning * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}
