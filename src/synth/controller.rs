use crate::{
    config::{KeyMode, SynthConfig},
    keys::KeyState,
};

use super::{
    factory::VoiceFactory,
    on_list::OnList,
    pool::VoicePool,
    voice::{UnisonInfo, Voice},
};

/*
Voice Controller
================

Decides which pooled voice plays which note. Runs on the render path, once
per detected key-table change, so every loop here is bounded by the pool size
(or the 128-entry key table) and nothing allocates.

Poly mode, two passes, always in this order:

  1. release   every on voice whose key now reads velocity 0 is released and
               dropped from the on-list. Voices freed here are available to
               the trigger pass of the same call.

  2. trigger   walk newly pressed keys newest first, at most
               min(poly_count, held keys) of them. For each note:
                 - release any on voice already playing it (an off→on pair
                   inside one polling gap must not stack two voices)
                 - allocate unison_count voices: the next key-off voice
                   round-robin from the cursor, else steal the on-list front
                 - the first voice of the group is the unison master

Mono / legato modes drive a fixed group at pool indices [0, unison_count).
The newest held key decides the note. A fresh press always retriggers and
latches its velocity; a key exposed by releasing another one retriggers only
if voice 0 is off or on a different note, and keeps the latched velocity.
Mono restarts every voice in the group. Legato changes the note everywhere
but only triggers the voices that were off.
*/

pub struct VoiceController<V> {
    pool: VoicePool<V>,
    on_list: OnList,
    key_mode: KeyMode,
    poly_count: usize,
    unison_count: usize,
    /// Index of the most recently allocated voice. Round-robin scans start after it
    cursor: usize,
    /// Velocity carried between mono/legato retriggers
    mono_velocity: u8,
}

impl<V: Voice> VoiceController<V> {
    /// Counts are clamped to `1..=pool size`.
    pub fn new(
        pool: VoicePool<V>,
        key_mode: KeyMode,
        poly_count: usize,
        unison_count: usize,
    ) -> Self {
        let on_list = OnList::with_capacity(pool.len());
        let limit = pool.len().max(1);
        Self {
            pool,
            on_list,
            key_mode,
            poly_count: poly_count.clamp(1, limit),
            unison_count: unison_count.clamp(1, limit),
            cursor: 0,
            mono_velocity: 0,
        }
    }

    pub fn from_config<F>(config: &SynthConfig, factory: &F) -> Self
    where
        F: VoiceFactory<Voice = V>,
    {
        let pool = VoicePool::new(config.pool_size, factory);
        Self::new(pool, config.key_mode, config.poly_count, config.unison_count)
    }

    /// Apply the current key table. Call once per detected change.
    pub fn trigger<K: KeyState>(&mut self, keys: &K) {
        match self.key_mode {
            KeyMode::Poly => self.trigger_poly(keys),
            KeyMode::Mono | KeyMode::Legato => self.trigger_mono(keys),
        }
    }

    fn trigger_poly<K: KeyState>(&mut self, keys: &K) {
        let pool = &mut self.pool;
        self.on_list.retain(|index| match pool.get_mut(index) {
            Some(voice) if keys.velocity_of(voice.note()) == 0 => {
                voice.release();
                false
            }
            Some(_) => true,
            None => false,
        });

        let count = self.poly_count.min(keys.held_key_count());
        for rank in 0..count {
            let Some(note) = keys.newly_pressed_key_by_rank(rank) else {
                break;
            };
            self.release_note(note);

            let velocity = keys.velocity_of(note);
            let mut master = None;
            for role in 0..self.unison_count {
                let Some(index) = self.allocate() else {
                    return;
                };
                self.cursor = index;
                let master_index = *master.get_or_insert(index);

                if let Some(voice) = self.pool.get_mut(index) {
                    voice.set_unison(UnisonInfo::new(master_index, self.unison_count, role));
                    voice.trigger(note, velocity);
                    self.on_list.push_back(index);
                }
            }
        }
    }

    fn trigger_mono<K: KeyState>(&mut self, keys: &K) {
        let group = self.unison_count.min(self.pool.len());

        if keys.held_key_count() == 0 {
            for index in 0..group {
                self.on_list.remove(index);
                if let Some(voice) = self.pool.get_mut(index) {
                    if voice.is_key_on() {
                        voice.release();
                    }
                }
            }
            self.mono_velocity = 0;
            return;
        }

        let note = match keys.newly_pressed_key_by_rank(0) {
            Some(note) => {
                self.mono_velocity = keys.velocity_of(note);
                note
            }
            None => {
                let Some(note) = keys.held_key_by_rank(0) else {
                    return;
                };
                let sounding = self
                    .pool
                    .get(0)
                    .is_some_and(|v| v.is_key_on() && v.note() == note);
                if sounding {
                    return;
                }
                // Nothing latched yet (e.g. right after a mode switch)
                if self.mono_velocity == 0 {
                    self.mono_velocity = keys.velocity_of(note);
                }
                note
            }
        };
        let velocity = self.mono_velocity;

        for index in 0..group {
            let Some(voice) = self.pool.get_mut(index) else {
                break;
            };
            let unison = UnisonInfo::new(0, group, index);

            if self.key_mode == KeyMode::Legato {
                voice.set_note(note, velocity);
                if !voice.is_key_on() {
                    voice.set_unison(unison);
                    voice.trigger(note, velocity);
                    self.on_list.remove(index);
                    self.on_list.push_back(index);
                }
            } else {
                voice.set_unison(unison);
                voice.trigger(note, velocity);
                self.on_list.remove(index);
                self.on_list.push_back(index);
            }
        }
    }

    /// Release and drop every on voice playing `note`.
    fn release_note(&mut self, note: u8) {
        let pool = &mut self.pool;
        self.on_list.retain(|index| match pool.get_mut(index) {
            Some(voice) if voice.note() == note => {
                voice.release();
                false
            }
            Some(_) => true,
            None => false,
        });
    }

    /// Pick a voice for a new note: the next free one, otherwise the oldest
    /// on voice, released first.
    fn allocate(&mut self) -> Option<usize> {
        if let Some(index) = self.next_off_voice() {
            return Some(index);
        }

        let index = self.on_list.pop_front()?;
        if let Some(voice) = self.pool.get_mut(index) {
            voice.release();
        }
        Some(index)
    }

    /// First key-off voice after the cursor, wrapping around the pool once.
    pub fn next_off_voice(&self) -> Option<usize> {
        let len = self.pool.len();
        (1..=len)
            .map(|step| (self.cursor + step) % len)
            .find(|&index| self.pool.get(index).is_some_and(|v| !v.is_key_on()))
    }

    /// Mix every playing voice, release tails included, into one sample.
    #[inline]
    pub fn signal_process(&mut self) -> f32 {
        let mut mix = 0.0;
        for voice in self.pool.iter_mut() {
            if voice.is_playing() {
                mix += voice.next_sample();
            }
        }
        mix
    }

    /// Release every key-on voice and empty the on-list.
    pub fn all_notes_off(&mut self) {
        for voice in self.pool.iter_mut() {
            if voice.is_key_on() {
                voice.release();
            }
        }
        self.on_list.clear();
        self.mono_velocity = 0;
    }

    /// Switch key mode. Sounding notes are released so no voice is left
    /// stranded outside the new mode's bookkeeping.
    pub fn set_key_mode(&mut self, key_mode: KeyMode) {
        if key_mode != self.key_mode {
            self.all_notes_off();
            self.key_mode = key_mode;
        }
    }

    pub fn set_unison_count(&mut self, unison_count: usize) {
        let unison_count = unison_count.clamp(1, self.pool.len().max(1));
        if unison_count != self.unison_count {
            self.all_notes_off();
            self.unison_count = unison_count;
        }
    }

    pub fn set_poly_count(&mut self, poly_count: usize) {
        self.poly_count = poly_count.clamp(1, self.pool.len().max(1));
    }

    pub fn pool(&self) -> &VoicePool<V> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut VoicePool<V> {
        &mut self.pool
    }

    pub fn on_list(&self) -> &OnList {
        &self.on_list
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    pub fn poly_count(&self) -> usize {
        self.poly_count
    }

    pub fn unison_count(&self) -> usize {
        self.unison_count
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mono_velocity(&self) -> u8 {
        self.mono_velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keys::KeyTable, synth::test_voice::TestVoice};

    fn controller(size: usize, mode: KeyMode, unison: usize) -> VoiceController<TestVoice> {
        let pool = VoicePool::new(size, &TestVoice::new);
        VoiceController::new(pool, mode, size, unison)
    }

    fn pump<K: KeyState>(ctrl: &mut VoiceController<TestVoice>, keys: &mut K) {
        if keys.has_changed() {
            ctrl.trigger(keys);
            keys.acknowledge_change();
        }
    }

    fn on_notes(ctrl: &VoiceController<TestVoice>) -> Vec<u8> {
        ctrl.on_list()
            .iter()
            .filter_map(|i| ctrl.pool().get(i).map(|v| v.note()))
            .collect()
    }

    #[test]
    fn next_off_voice_wraps_once_from_the_cursor() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(3, KeyMode::Poly, 1);
        assert_eq!(ctrl.next_off_voice(), Some(1));

        table.press(60, 100);
        table.press(62, 100);
        pump(&mut ctrl, &mut keys);
        // voices 1 and 2 are on, cursor sits on 2
        assert_eq!(ctrl.cursor(), 2);
        assert_eq!(ctrl.next_off_voice(), Some(0));

        table.press(64, 100);
        pump(&mut ctrl, &mut keys);
        assert_eq!(ctrl.next_off_voice(), None);
    }

    #[test]
    fn release_pass_frees_voices_for_the_same_call() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(1, KeyMode::Poly, 1);

        table.press(60, 100);
        pump(&mut ctrl, &mut keys);

        table.release(60);
        table.press(62, 100);
        pump(&mut ctrl, &mut keys);

        let voice = ctrl.pool().get(0).unwrap();
        assert_eq!(voice.note(), 62);
        assert_eq!(voice.releases, 1);
        assert_eq!(on_notes(&ctrl), vec![62]);
    }

    #[test]
    fn poly_count_limits_notes_per_pass_not_sounding_notes() {
        let (table, mut keys) = KeyTable::shared();
        let pool = VoicePool::new(4, &TestVoice::new);
        let mut ctrl = VoiceController::new(pool, KeyMode::Poly, 2, 1);

        for note in [60, 62, 64] {
            table.press(note, 100);
            pump(&mut ctrl, &mut keys);
        }

        // Free voices are used before anything is stolen
        assert_eq!(ctrl.on_list().iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(on_notes(&ctrl), vec![60, 62, 64]);
        assert!(ctrl.pool().iter().all(|v| v.releases == 0));
    }

    #[test]
    fn unison_group_shares_a_master() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(8, KeyMode::Poly, 3);

        table.press(60, 100);
        pump(&mut ctrl, &mut keys);

        let group: Vec<usize> = ctrl.on_list().iter().collect();
        assert_eq!(group, vec![1, 2, 3]);
        for (role, &index) in group.iter().enumerate() {
            let unison = ctrl.pool().get(index).unwrap().unison();
            assert_eq!(unison, UnisonInfo::new(1, 3, role));
        }
    }

    #[test]
    fn empty_pool_is_a_silent_no_op() {
        let (table, mut keys) = KeyTable::shared();
        let mut poly = controller(0, KeyMode::Poly, 1);
        let mut mono = controller(0, KeyMode::Mono, 1);

        table.press(60, 100);
        keys.has_changed();
        poly.trigger(&keys);
        mono.trigger(&keys);

        assert!(poly.on_list().is_empty());
        assert!(mono.on_list().is_empty());
        assert_eq!(poly.signal_process(), 0.0);
    }

    #[test]
    fn unison_larger_than_pool_steals_within_bounds() {
        let (table, mut keys) = KeyTable::shared();
        let pool = VoicePool::new(2, &TestVoice::new);
        let mut ctrl = VoiceController::new(pool, KeyMode::Poly, 2, 2);
        // bypass the clamp to exercise the degenerate path
        ctrl.unison_count = 3;

        table.press(60, 100);
        pump(&mut ctrl, &mut keys);

        assert!(ctrl.on_list().len() <= 2);
        assert!(ctrl.pool().iter().all(|v| v.note() == 60));
    }

    #[test]
    fn mode_switch_releases_everything() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(4, KeyMode::Poly, 1);
        table.press(60, 100);
        table.press(64, 100);
        pump(&mut ctrl, &mut keys);
        assert_eq!(ctrl.on_list().len(), 2);

        ctrl.set_key_mode(KeyMode::Mono);
        assert!(ctrl.on_list().is_empty());
        assert!(ctrl.pool().iter().all(|v| !v.is_key_on()));
    }

    #[test]
    fn mono_after_mode_switch_uses_the_held_velocity() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(4, KeyMode::Poly, 1);
        table.press(60, 90);
        pump(&mut ctrl, &mut keys);

        ctrl.set_key_mode(KeyMode::Mono);
        table.press(64, 70);
        table.release(64);
        pump(&mut ctrl, &mut keys);

        let voice = ctrl.pool().get(0).unwrap();
        assert!(voice.is_key_on());
        assert_eq!(voice.note(), 60);
        assert_eq!(voice.velocity(), 90);
    }

    #[test]
    fn counts_are_clamped_to_the_pool() {
        let mut ctrl = controller(4, KeyMode::Poly, 1);
        ctrl.set_unison_count(10);
        ctrl.set_poly_count(0);
        assert_eq!(ctrl.unison_count(), 4);
        assert_eq!(ctrl.poly_count(), 1);
    }

    #[test]
    fn signal_process_sums_playing_voices_only() {
        let (table, mut keys) = KeyTable::shared();
        let mut ctrl = controller(4, KeyMode::Poly, 1);
        assert_eq!(ctrl.signal_process(), 0.0);

        table.press(60, 100);
        table.press(62, 100);
        pump(&mut ctrl, &mut keys);
        // voices 1 and 2 output 2.0 and 3.0
        assert_eq!(ctrl.signal_process(), 5.0);

        table.release(60);
        pump(&mut ctrl, &mut keys);
        // released voice keeps playing its tail
        assert_eq!(ctrl.signal_process(), 5.0);
    }
}
