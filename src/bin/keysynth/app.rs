//! Wiring: audio output, key table, synth, inputs and UI, torn down in
//! reverse order.

use std::sync::Arc;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use keysynth::{
    io::{AudioSink, CpalSink},
    keys::KeyTable,
    synth::Synth,
    SynthConfig,
};
use log::{info, warn};
use ratatui::DefaultTerminal;
use rtrb::RingBuffer;

use super::{
    input::{self, KeyboardInput},
    ui::UiApp,
};

/// Samples buffered between the render path and the UI (~0.7 s at 48 kHz).
const DISPLAY_RING: usize = 32_768;

pub fn run(
    config: SynthConfig,
    midi_port: Option<&str>,
    midi_channel: Option<u8>,
    terminal: &mut DefaultTerminal,
) -> EyreResult<()> {
    let mut sink = CpalSink::open().wrap_err("failed to open audio output")?;
    let (keys, reader) = KeyTable::shared();
    let (display_tx, display_rx) = RingBuffer::new(DISPLAY_RING);

    let handle = Synth::create(&config, &mut sink, reader, display_tx)
        .wrap_err("failed to create synth")?;
    sink.start().wrap_err("failed to start audio output")?;

    // A missing MIDI device is not fatal; the computer keyboard still plays
    let midi = midi_port.and_then(|port| {
        match input::connect_midi(port, midi_channel, Arc::clone(&keys)) {
            Ok(connection) => Some(connection),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    });

    let keyboard = KeyboardInput::new(Arc::clone(&keys));
    let mut ui = UiApp::new(display_rx, handle, keyboard, &config, midi.is_some());
    let result = ui.run(terminal);

    // Stop writers before the synth goes away
    if let Some(connection) = midi {
        connection.close();
    }
    let handle = ui.into_handle();
    handle.destroy(&mut sink);
    drop(sink);
    info!("shut down");

    result
}
