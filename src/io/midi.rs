use crate::keys::KeyTable;

/// Controller number of the "All Notes Off" channel mode message.
const ALL_NOTES_OFF: u8 = 123;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiEvent {
    /// Decode one note or control change message. Everything else, running
    /// status and system messages included, is ignored.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let byte = |i: usize| data.get(i).map(|b| b & 0x7F);

        let event = match status & 0xF0 {
            0x80 => MidiEvent::NoteOff {
                channel,
                key: byte(0)?,
                velocity: byte(1)?,
            },
            0x90 => MidiEvent::NoteOn {
                channel,
                key: byte(0)?,
                velocity: byte(1)?,
            },
            0xB0 => MidiEvent::ControlChange {
                channel,
                controller: byte(0)?,
                value: byte(1)?,
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. } => channel,
        }
    }

    /// Update the key table. `channel_filter` is zero-based; `None` listens
    /// to every channel.
    ///
    /// Returns true if the event was a key-table update.
    pub fn apply(self, keys: &KeyTable, channel_filter: Option<u8>) -> bool {
        if channel_filter.is_some_and(|c| c != self.channel()) {
            return false;
        }
        match self {
            // Note-on with velocity 0 is a note-off by convention
            MidiEvent::NoteOn { key, velocity, .. } => keys.press(key, velocity),
            MidiEvent::NoteOff { key, .. } => keys.release(key),
            MidiEvent::ControlChange {
                controller: ALL_NOTES_OFF,
                ..
            } => keys.release_all(),
            _ => return false,
        }
        true
    }
}
