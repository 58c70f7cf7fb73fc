//! Note input: MIDI ports through midir and the computer keyboard.
//!
//! Both write straight into the shared [`KeyTable`]; the render path picks
//! the changes up on its next sample.

use std::sync::Arc;

use keysynth::{io::MidiEvent, keys::KeyTable, Error};
use log::{info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};

const CLIENT_NAME: &str = "keysynth";

pub fn list_midi_ports() -> keysynth::Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// Open the first input port whose name contains `filter` (case-insensitive).
///
/// `channel` is zero-based; `None` takes every channel. The connection feeds
/// the key table until it is dropped.
pub fn connect_midi(
    filter: &str,
    channel: Option<u8>,
    keys: Arc<KeyTable>,
) -> keysynth::Result<MidiInputConnection<()>> {
    let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;
    midi_in.ignore(Ignore::All);

    let needle = filter.to_lowercase();
    let (port, name) = midi_in
        .ports()
        .into_iter()
        .filter_map(|port| midi_in.port_name(&port).ok().map(|name| (port, name)))
        .find(|(_, name)| name.to_lowercase().contains(&needle))
        .ok_or_else(|| Error::MidiPortNotFound(filter.to_string()))?;

    let connection = midi_in
        .connect(
            &port,
            "keysynth-in",
            move |_stamp, bytes, _| {
                if let Some(event) = MidiEvent::parse(bytes) {
                    event.apply(&keys, channel);
                }
            },
            (),
        )
        .map_err(|e| {
            warn!("failed to connect to MIDI port {name}: {e}");
            Error::MidiInit(e.to_string())
        })?;

    match channel {
        Some(channel) => info!("listening on MIDI port {name}, channel {}", channel + 1),
        None => info!("listening on MIDI port {name}, all channels"),
    }
    Ok(connection)
}

/// Two rows of a piano laid over the keyboard, lowest note first.
const LOWER_ROW: [char; 12] = ['z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm'];
const UPPER_ROW: [char; 12] = ['q', '2', 'w', '3', 'e', 'r', '5', 't', '6', 'y', '7', 'u'];

const KEYBOARD_VELOCITY: u8 = 100;

/// Computer keyboard as a note source.
///
/// Terminals report presses but not releases, so each note key latches:
/// the first press holds the note, the next one releases it.
pub struct KeyboardInput {
    keys: Arc<KeyTable>,
    base_note: u8,
}

impl KeyboardInput {
    pub fn new(keys: Arc<KeyTable>) -> Self {
        Self { keys, base_note: 48 }
    }

    pub fn note_for(&self, c: char) -> Option<u8> {
        let c = c.to_ascii_lowercase();
        let offset = LOWER_ROW
            .iter()
            .position(|&k| k == c)
            .or_else(|| UPPER_ROW.iter().position(|&k| k == c).map(|i| i + 12))?;
        let note = self.base_note as usize + offset;
        u8::try_from(note).ok().filter(|&n| n < 128)
    }

    /// Toggle the note under `c`. Returns the note if `c` is a note key.
    pub fn toggle(&mut self, c: char) -> Option<u8> {
        let note = self.note_for(c)?;
        if self.keys.is_held(note) {
            self.keys.release(note);
        } else {
            self.keys.press(note, KEYBOARD_VELOCITY);
        }
        Some(note)
    }

    pub fn octave_up(&mut self) {
        if self.base_note <= 96 {
            self.base_note += 12;
        }
    }

    pub fn octave_down(&mut self) {
        if self.base_note >= 12 {
            self.base_note -= 12;
        }
    }

    pub fn base_note(&self) -> u8 {
        self.base_note
    }

    pub fn release_all(&self) {
        self.keys.release_all();
    }
}
