use crate::{config::EnvelopeConfig, MIN_TIME};

/*
Linear ADSR
===========

    Level
      1.0 ┐   ╱╲
          │  ╱  ╲________
      S   │ ╱            ╲
      0.0 └╱──────────────╲──→ Time
          A   D     S      R

Stages advance one sample at a time. `note_on` restarts from zero (a hard
retrigger, which is what mono mode relies on to sound a fresh attack);
`note_off` ramps from whatever level the envelope is at, so releasing during
the attack does not click.

Per-stage increments are computed once when the envelope is built, since the
sample rate is fixed for the lifetime of a voice pool.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    sustain_level: f32,
    attack_step: f32,
    decay_step: f32,
    release_samples: u32,

    stage: EnvelopeStage,
    level: f32,

    release_start_level: f32,
    release_elapsed: u32,
}

impl Envelope {
    pub fn new(config: EnvelopeConfig, sample_rate: f32) -> Self {
        let sustain_level = config.sustain.clamp(0.0, 1.0);
        let attack = config.attack.max(MIN_TIME);
        let decay = config.decay.max(MIN_TIME);
        let release = config.release.max(MIN_TIME);

        Self {
            sustain_level,
            attack_step: 1.0 / (attack * sample_rate),
            decay_step: (1.0 - sustain_level) / (decay * sample_rate),
            release_samples: (release * sample_rate).round().max(1.0) as u32,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_elapsed: 0,
        }
    }

    /// Gate high: restart the attack from zero.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed = 0;
    }

    /// Gate low: ramp from the current level down to zero.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        self.release_start_level = self.level;
        self.release_elapsed = 0;
        self.stage = EnvelopeStage::Release;
    }

    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.level -= self.decay_step;
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeStage::Release => {
                let progress = self.release_elapsed as f32 / self.release_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);
                self.release_elapsed = self.release_elapsed.saturating_add(1);
                if self.release_elapsed >= self.release_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn envelope(attack: f32, decay: f32, sustain: f32, release: f32) -> Envelope {
        Envelope::new(
            EnvelopeConfig {
                attack,
                decay,
                sustain,
                release,
            },
            SAMPLE_RATE,
        )
    }

    fn run(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = envelope(0.01, 0.1, 0.7, 0.2);
        env.note_on();
        run(&mut env, 11);

        assert!(env.level() > 0.99);
        assert_ne!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn sustain_holds_target_level() {
        let mut env = envelope(0.01, 0.05, 0.6, 0.2);
        env.note_on();
        run(&mut env, 70);

        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.6).abs() < 1e-4);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let mut env = envelope(0.01, 0.05, 0.5, 0.03);
        env.note_on();
        run(&mut env, 20);

        env.note_off();
        assert!(env.is_active());
        run(&mut env, 32);

        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn note_on_restarts_from_zero() {
        let mut env = envelope(0.01, 0.05, 0.5, 0.1);
        env.note_on();
        run(&mut env, 40);
        assert!(env.level() > 0.4);

        env.note_on();
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn note_off_while_idle_stays_idle() {
        let mut env = envelope(0.01, 0.05, 0.5, 0.1);
        env.note_off();
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }
}
