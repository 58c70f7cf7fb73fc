//! Voice grid - one cell per pooled voice

use keysynth::synth::{VoiceSnapshot, VoiceState, VoiceView};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::status::note_name;

const CELL_WIDTH: u16 = 12;

fn cell_style(view: &VoiceView) -> Style {
    let color = match view.state {
        VoiceState::Idle => Color::DarkGray,
        VoiceState::Triggered => Color::Green,
        VoiceState::Releasing => Color::Yellow,
    };
    let style = Style::default().fg(color);
    if view.unison.is_master() && view.state != VoiceState::Idle {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn cell_text(index: usize, view: &VoiceView) -> String {
    if view.state == VoiceState::Idle {
        return format!("{index:>2} ----");
    }
    let role = if view.unison.size > 1 {
        format!(" {}/{}", view.unison.role + 1, view.unison.size)
    } else {
        String::new()
    };
    format!("{index:>2} {:<4}{role}", note_name(view.note))
}

pub fn render_voices(frame: &mut Frame, area: Rect, snapshot: &VoiceSnapshot) {
    let title = if snapshot.pool_size > snapshot.voices().len() {
        format!(
            " Voices (first {} of {}) ",
            snapshot.voices().len(),
            snapshot.pool_size
        )
    } else {
        " Voices ".to_string()
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let per_row = (inner.width / CELL_WIDTH).max(1) as usize;
    let rows: Vec<Line> = snapshot
        .voices()
        .chunks(per_row)
        .enumerate()
        .map(|(row, views)| {
            let spans: Vec<Span> = views
                .iter()
                .enumerate()
                .map(|(col, view)| {
                    let text = cell_text(row * per_row + col, view);
                    Span::styled(
                        format!("{text:<width$}", width = CELL_WIDTH as usize),
                        cell_style(view),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let legend = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(Paragraph::new(rows), legend[0]);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("key on  ", Style::default().fg(Color::Green)),
            Span::styled("releasing  ", Style::default().fg(Color::Yellow)),
            Span::styled("bold = unison master", Style::default().fg(Color::DarkGray)),
        ])),
        legend[1],
    );
}
