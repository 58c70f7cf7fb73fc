#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use keysynth::{
    keys::{KeyReader, KeyState, KeyTable},
    synth::{UnisonInfo, Voice, VoiceController, VoicePool},
    KeyMode,
};

/// Voice that records how the controller drove it.
///
/// Outputs `index + 1` while playing and keeps playing after release until
/// `finish_release` is called, so release tails can be observed.
#[derive(Debug, Default)]
pub struct MockVoice {
    pub index: usize,
    pub note: u8,
    pub velocity: u8,
    pub key_on: bool,
    pub playing: bool,
    pub unison: UnisonInfo,
    pub triggers: usize,
    pub releases: usize,
    pub note_changes: usize,
    /// Bumped on every call from the render path
    pub accesses: Option<Arc<AtomicUsize>>,
}

impl MockVoice {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn counted(index: usize, accesses: Arc<AtomicUsize>) -> Self {
        Self {
            index,
            accesses: Some(accesses),
            ..Default::default()
        }
    }

    pub fn finish_release(&mut self) {
        if !self.key_on {
            self.playing = false;
        }
    }

    fn touch(&self) {
        if let Some(accesses) = &self.accesses {
            accesses.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Voice for MockVoice {
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
        self.touch();
        if note != self.note {
            self.note_changes += 1;
        }
        self.note = note;
        self.velocity = velocity;
    }

    fn trigger(&mut self, note: u8, velocity: u8) {
        self.set_note(note, velocity);
        self.key_on = true;
        self.playing = true;
        self.triggers += 1;
    }

    fn release(&mut self) {
        self.touch();
        self.key_on = false;
        self.releases += 1;
    }

    fn set_unison(&mut self, unison: UnisonInfo) {
        self.unison = unison;
    }

    fn unison(&self) -> UnisonInfo {
        self.unison
    }

    fn next_sample(&mut self) -> f32 {
        self.touch();
        (self.index + 1) as f32
    }
}

pub fn controller(pool_size: usize, mode: KeyMode, unison: usize) -> VoiceController<MockVoice> {
    let pool = VoicePool::new(pool_size, &MockVoice::new);
    VoiceController::new(pool, mode, pool_size, unison)
}

/// Key table plus a controller, pumped the way the render callback does it.
pub struct Rig {
    pub table: Arc<KeyTable>,
    pub keys: KeyReader,
    pub ctrl: VoiceController<MockVoice>,
}

impl Rig {
    pub fn new(pool_size: usize, mode: KeyMode, unison: usize) -> Self {
        let (table, keys) = KeyTable::shared();
        Self {
            table,
            keys,
            ctrl: controller(pool_size, mode, unison),
        }
    }

    /// Run the trigger algorithm if the key table changed. Returns whether it ran.
    pub fn pump(&mut self) -> bool {
        if self.keys.has_changed() {
            self.ctrl.trigger(&self.keys);
            self.keys.acknowledge_change();
            return true;
        }
        false
    }

    pub fn press(&mut self, note: u8) {
        self.table.press(note, 100);
        self.pump();
    }

    pub fn release(&mut self, note: u8) {
        self.table.release(note);
        self.pump();
    }

    pub fn voice(&self, index: usize) -> &MockVoice {
        self.ctrl.pool().get(index).expect("voice in pool")
    }

    /// Notes of the on-list, oldest first.
    pub fn on_notes(&self) -> Vec<u8> {
        self.ctrl
            .on_list()
            .iter()
            .map(|index| self.voice(index).note)
            .collect()
    }

    pub fn on_indices(&self) -> Vec<usize> {
        self.ctrl.on_list().iter().collect()
    }

    pub fn total_triggers(&self) -> usize {
        self.ctrl.pool().iter().map(|v| v.triggers).sum()
    }

    pub fn total_releases(&self) -> usize {
        self.ctrl.pool().iter().map(|v| v.releases).sum()
    }

    /// Check the on-list invariants that hold in every mode.
    pub fn assert_on_list_consistent(&self) {
        let on = self.on_indices();
        assert!(on.len() <= self.ctrl.pool().len());
        for &index in &on {
            assert!(self.voice(index).key_on, "voice {index} on the list but key off");
        }
        let mut sorted = on.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), on.len(), "voice listed twice: {on:?}");
    }

    /// No note appears twice among on voices (poly mode, unison 1).
    pub fn assert_no_duplicate_notes(&self) {
        let mut notes = self.on_notes();
        notes.sort_unstable();
        let len = notes.len();
        notes.dedup();
        assert_eq!(notes.len(), len, "duplicate note on the list");
    }
}
