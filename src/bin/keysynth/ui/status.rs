//! Status bar - key mode, voice counts, callback load and output level

use keysynth::synth::VoiceSnapshot;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::Settings;

pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    settings: &Settings,
    snapshot: &VoiceSnapshot,
    stats: &AudioStats,
) {
    let block = Block::default()
        .title(" keysynth ")
        .borders(Borders::ALL);

    let clipping = stats.peak >= 1.0;
    let midi = if settings.midi_connected { "MIDI" } else { "no MIDI" };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", settings.key_mode.as_str().to_uppercase()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "unison {}  poly {}/{}  ",
                settings.unison_count, settings.poly_count, settings.pool_size
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "on {}  playing {}  ",
                snapshot.on_count,
                snapshot.playing_count()
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("octave {}  ", note_name(settings.base_note)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(
                "cb {:.1}us (peak {:.1}us)  ",
                snapshot.process_time.as_secs_f64() * 1e6,
                snapshot.peak_process_time.as_secs_f64() * 1e6
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}  ", stats.peak, stats.rms),
            Style::default().fg(if clipping { Color::Red } else { Color::Magenta }),
        ),
        Span::styled(midi, Style::default().fg(Color::DarkGray)),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
