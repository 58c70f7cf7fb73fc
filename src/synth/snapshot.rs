//! Voice state snapshots for display.
//!
//! Captured on the render path and pushed through a bounded ring, so a
//! snapshot is `Copy`, fixed-size and allocation-free.

use std::time::Duration;

use crate::config::KeyMode;

use super::{
    controller::VoiceController,
    voice::{UnisonInfo, Voice, VoiceState},
};

/// Voices included in a snapshot. Larger pools are truncated.
pub const SNAPSHOT_VOICES: usize = 32;

/// Samples between two snapshots (~21 ms at 48 kHz).
pub const SNAPSHOT_INTERVAL: usize = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoiceView {
    pub note: u8,
    pub velocity: u8,
    pub state: VoiceState,
    pub unison: UnisonInfo,
}

#[derive(Clone, Copy, Debug)]
pub struct VoiceSnapshot {
    voices: [VoiceView; SNAPSHOT_VOICES],
    voice_count: usize,
    /// Full pool size, which may exceed `voice_count`
    pub pool_size: usize,
    /// Entries on the on-list
    pub on_count: usize,
    pub key_mode: KeyMode,
    pub poly_count: usize,
    pub unison_count: usize,
    /// Processing time of the callback that took the snapshot
    pub process_time: Duration,
    /// Longest callback since the previous snapshot
    pub peak_process_time: Duration,
}

impl VoiceSnapshot {
    pub fn capture<V: Voice>(controller: &VoiceController<V>) -> Self {
        let mut voices = [VoiceView::default(); SNAPSHOT_VOICES];
        let mut voice_count = 0;
        for (view, voice) in voices.iter_mut().zip(controller.pool().iter()) {
            *view = VoiceView {
                note: voice.note(),
                velocity: voice.velocity(),
                state: voice.state(),
                unison: voice.unison(),
            };
            voice_count += 1;
        }

        Self {
            voices,
            voice_count,
            pool_size: controller.pool().len(),
            on_count: controller.on_list().len(),
            key_mode: controller.key_mode(),
            poly_count: controller.poly_count(),
            unison_count: controller.unison_count(),
            process_time: Duration::ZERO,
            peak_process_time: Duration::ZERO,
        }
    }

    pub fn voices(&self) -> &[VoiceView] {
        &self.voices[..self.voice_count]
    }

    pub fn playing_count(&self) -> usize {
        self.voices()
            .iter()
            .filter(|v| v.state != VoiceState::Idle)
            .count()
    }
}

impl Default for VoiceSnapshot {
    fn default() -> Self {
        Self {
            voices: [VoiceView::default(); SNAPSHOT_VOICES],
            voice_count: 0,
            pool_size: 0,
            on_count: 0,
            key_mode: KeyMode::default(),
            poly_count: 0,
            unison_count: 0,
            process_time: Duration::ZERO,
            peak_process_time: Duration::ZERO,
        }
    }
}
