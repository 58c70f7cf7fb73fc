use std::sync::{
    atomic::{AtomicU64, AtomicU8, Ordering},
    Arc, Mutex,
};

use super::KeyState;
use crate::NOTE_COUNT;

/*
Shared Key Table
================

One table per synth, shared between exactly two contexts:

  control side   MIDI callback / UI thread. Presses and releases keys.
  render side    Audio callback. Reads key state once per detected change.

Per note we keep two atomics:

  velocity   0 = key up, anything else = key held with that velocity
  stamp      value of the revision counter when the key was last pressed

and one table-wide `revision` counter, bumped on every press or release. The
revision is the change flag: the render side remembers the last revision it
handled and compares. Because stamps come from the same counter, "pressed
since the last check" is simply `seen < stamp <= observed`, and "newest
first" is "highest stamp first".

When the reader sees a new revision it copies the table once into a
snapshot: velocities plus the held keys sorted newest first. A trigger pass
reads only that snapshot, so every view it asks for agrees. A key stamped
after `observed` is left out of the snapshot entirely and shows up as newly
pressed on the next pass.

Writers are serialized by a mutex that only the control side ever takes. The
render side never locks and never writes the table.

Ordering: a writer stores the stamp, then the velocity with Release, then
publishes the new revision with Release. The reader loads the revision with
Acquire and each velocity with Acquire before its stamp, so a velocity from a
later press always comes with that press's stamp and gets filtered out.
*/

pub struct KeyTable {
    velocities: [AtomicU8; NOTE_COUNT],
    stamps: [AtomicU64; NOTE_COUNT],
    revision: AtomicU64,
    writer: Mutex<()>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self {
            velocities: std::array::from_fn(|_| AtomicU8::new(0)),
            stamps: std::array::from_fn(|_| AtomicU64::new(0)),
            revision: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    /// Create a shared table and a render-side reader for it.
    pub fn shared() -> (Arc<Self>, KeyReader) {
        let table = Arc::new(Self::new());
        let reader = KeyReader::new(Arc::clone(&table));
        (table, reader)
    }

    /// Key down. A velocity of 0 is treated as a release.
    pub fn press(&self, note: u8, velocity: u8) {
        if velocity == 0 {
            self.release(note);
            return;
        }
        let idx = note as usize;
        if idx >= NOTE_COUNT {
            return;
        }

        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let next = self.revision.load(Ordering::Relaxed) + 1;
        self.stamps[idx].store(next, Ordering::Relaxed);
        self.velocities[idx].store(velocity, Ordering::Release);
        self.revision.store(next, Ordering::Release);
    }

    /// Key up. Releasing a key that is not held is not a change.
    pub fn release(&self, note: u8) {
        let idx = note as usize;
        if idx >= NOTE_COUNT {
            return;
        }

        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if self.velocities[idx].swap(0, Ordering::Relaxed) == 0 {
            return;
        }
        let next = self.revision.load(Ordering::Relaxed) + 1;
        self.revision.store(next, Ordering::Release);
    }

    /// Release every held key as a single change.
    pub fn release_all(&self) {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = false;
        for velocity in &self.velocities {
            changed |= velocity.swap(0, Ordering::Relaxed) != 0;
        }
        if changed {
            let next = self.revision.load(Ordering::Relaxed) + 1;
            self.revision.store(next, Ordering::Release);
        }
    }

    pub fn velocity(&self, note: u8) -> u8 {
        self.velocities
            .get(note as usize)
            .map_or(0, |v| v.load(Ordering::Relaxed))
    }

    pub fn is_held(&self, note: u8) -> bool {
        self.velocity(note) > 0
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Copy every key stamped at or before `ceiling` into `velocities` and
    /// `ranked`, newest first. Returns the number of held keys.
    fn snapshot(
        &self,
        ceiling: u64,
        velocities: &mut [u8; NOTE_COUNT],
        ranked: &mut [(u8, u64); NOTE_COUNT],
    ) -> usize {
        let mut held = 0;
        for (note, out) in velocities.iter_mut().enumerate() {
            let velocity = self.velocities[note].load(Ordering::Acquire);
            let stamp = self.stamps[note].load(Ordering::Relaxed);
            if velocity == 0 || stamp > ceiling {
                *out = 0;
                continue;
            }
            *out = velocity;
            ranked[held] = (note as u8, stamp);
            held += 1;
        }
        // Stamps are unique, so the order is total
        ranked[..held].sort_unstable_by(|a, b| b.1.cmp(&a.1));
        held
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Render-side view of a [`KeyTable`].
///
/// Every query answers from the snapshot taken by the last
/// [`has_changed`](KeyState::has_changed) that saw a new revision.
pub struct KeyReader {
    table: Arc<KeyTable>,
    /// Last revision acknowledged
    seen: u64,
    /// Revision the snapshot was taken at
    observed: u64,
    velocities: [u8; NOTE_COUNT],
    /// Held keys and their stamps, newest first. Only `..held` is valid
    ranked: [(u8, u64); NOTE_COUNT],
    held: usize,
}

impl KeyReader {
    pub fn new(table: Arc<KeyTable>) -> Self {
        let seen = table.revision();
        let mut reader = Self {
            table,
            seen,
            observed: seen,
            velocities: [0; NOTE_COUNT],
            ranked: [(0, 0); NOTE_COUNT],
            held: 0,
        };
        reader.refresh();
        reader
    }

    pub fn table(&self) -> &Arc<KeyTable> {
        &self.table
    }

    fn refresh(&mut self) {
        self.held = self
            .table
            .snapshot(self.observed, &mut self.velocities, &mut self.ranked);
    }

    fn ranked(&self) -> &[(u8, u64)] {
        &self.ranked[..self.held]
    }
}

impl KeyState for KeyReader {
    fn has_changed(&mut self) -> bool {
        let revision = self.table.revision();
        if revision != self.observed {
            self.observed = revision;
            self.refresh();
        }
        self.observed != self.seen
    }

    fn acknowledge_change(&mut self) {
        self.seen = self.observed;
    }

    fn held_key_count(&self) -> usize {
        self.held
    }

    fn held_key_by_rank(&self, rank: usize) -> Option<u8> {
        self.ranked().get(rank).map(|&(note, _)| note)
    }

    // Newly pressed keys carry the highest stamps, so they form a prefix of
    // the ranking.
    fn newly_pressed_key_by_rank(&self, rank: usize) -> Option<u8> {
        self.ranked()
            .get(rank)
            .filter(|&&(_, stamp)| stamp > self.seen)
            .map(|&(note, _)| note)
    }

    fn velocity_of(&self, note: u8) -> u8 {
        self.velocities.get(note as usize).copied().unwrap_or(0)
    }
}
