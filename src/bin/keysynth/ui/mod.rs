//! TUI module for keysynth
//!
//! Oscilloscope, spectrum and voice activity, plus the computer keyboard.

mod spectrum;
mod status;
mod voices;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use keysynth::{
    synth::{ControlMessage, SynthHandle, VoiceSnapshot},
    KeyMode, SynthConfig,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use super::input::KeyboardInput;

use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_status, AudioStats};
use voices::render_voices;
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// Settings the UI last asked for. Overwritten by every snapshot.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub key_mode: KeyMode,
    pub unison_count: usize,
    pub poly_count: usize,
    pub pool_size: usize,
    pub base_note: u8,
    pub midi_connected: bool,
}

pub struct UiApp {
    audio_rx: Consumer<f32>,
    handle: SynthHandle,
    keyboard: KeyboardInput,
    snapshot: VoiceSnapshot,
    settings: Settings,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        audio_rx: Consumer<f32>,
        handle: SynthHandle,
        keyboard: KeyboardInput,
        config: &SynthConfig,
        midi_connected: bool,
    ) -> Self {
        let spectrum = SpectrumAnalyzer::new(VIS_BUFFER_SIZE, handle.sample_rate());
        let settings = Settings {
            key_mode: config.key_mode,
            unison_count: config.unison_count,
            poly_count: config.poly_count,
            pool_size: config.pool_size,
            base_note: keyboard.base_note(),
            midi_connected,
        };
        Self {
            audio_rx,
            handle,
            keyboard,
            snapshot: VoiceSnapshot::default(),
            settings,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum,
            should_quit: false,
        }
    }

    /// Give the synth handle back for teardown.
    pub fn into_handle(self) -> SynthHandle {
        self.handle
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_snapshot();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }

        if received {
            if self.audio_buffer.len() > VIS_BUFFER_SIZE {
                let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
                self.audio_buffer.drain(0..excess);
            }
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn poll_snapshot(&mut self) {
        if let Some(snapshot) = self.handle.latest_snapshot() {
            self.settings.key_mode = snapshot.key_mode;
            self.settings.unison_count = snapshot.unison_count;
            self.settings.poly_count = snapshot.poly_count;
            self.snapshot = snapshot;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let pool = self.settings.pool_size.max(1);
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.settings.key_mode = self.settings.key_mode.next();
                self.handle
                    .send(ControlMessage::SetKeyMode(self.settings.key_mode));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.settings.unison_count = (self.settings.unison_count + 1).min(pool);
                self.handle
                    .send(ControlMessage::SetUnison(self.settings.unison_count));
            }
            KeyCode::Char('-') => {
                self.settings.unison_count = self.settings.unison_count.saturating_sub(1).max(1);
                self.handle
                    .send(ControlMessage::SetUnison(self.settings.unison_count));
            }
            KeyCode::Up => {
                self.settings.poly_count = (self.settings.poly_count + 1).min(pool);
                self.handle
                    .send(ControlMessage::SetPolyCount(self.settings.poly_count));
            }
            KeyCode::Down => {
                self.settings.poly_count = self.settings.poly_count.saturating_sub(1).max(1);
                self.handle
                    .send(ControlMessage::SetPolyCount(self.settings.poly_count));
            }
            KeyCode::Left => self.keyboard.octave_down(),
            KeyCode::Right => self.keyboard.octave_up(),
            KeyCode::Char(' ') => {
                self.keyboard.release_all();
                self.handle.send(ControlMessage::AllNotesOff);
            }
            KeyCode::Char(c) => {
                self.keyboard.toggle(c);
            }
            _ => {}
        }
        self.settings.base_note = self.keyboard.base_note();
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(6),    // Voice grid
                Constraint::Length(10), // Scope + spectrum
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(frame, chunks[0], &self.settings, &self.snapshot, &stats);
        render_voices(frame, chunks[1], &self.snapshot);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.spectrum.data());

        let help = Paragraph::new(
            " [z..m q..u] Notes  [Space] All off  [Tab] Mode  [+/-] Unison  [Up/Down] Poly  [Left/Right] Octave  [Esc] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
