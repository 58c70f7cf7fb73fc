//! Key-state input.
//!
//! The control side (MIDI decoder, computer keyboard) writes key presses into
//! a shared [`KeyTable`]. The render side reads it through a [`KeyReader`],
//! which implements [`KeyState`], the view the voice controller triggers from.

mod table;

pub use table::{KeyReader, KeyTable};

/// Read-only view of held keys, as seen from the render path.
///
/// Ranks count from the newest key: rank 0 is the most recently pressed.
/// Velocity 0 means the key is up; any other value means it is held.
pub trait KeyState {
    /// Whether the table changed since the last [`acknowledge_change`].
    ///
    /// On a new revision this also takes the snapshot every other query
    /// answers from, so presses landing mid-pass are picked up on the next one.
    ///
    /// [`acknowledge_change`]: KeyState::acknowledge_change
    fn has_changed(&mut self) -> bool;

    /// Mark everything observed by the last [`has_changed`] as handled.
    ///
    /// [`has_changed`]: KeyState::has_changed
    fn acknowledge_change(&mut self);

    fn held_key_count(&self) -> usize;

    /// Note number of the `rank`-th newest held key, new or not.
    fn held_key_by_rank(&self, rank: usize) -> Option<u8>;

    /// Note number of the `rank`-th newest key pressed since the last acknowledge.
    fn newly_pressed_key_by_rank(&self, rank: usize) -> Option<u8>;

    fn velocity_of(&self, note: u8) -> u8;
}
