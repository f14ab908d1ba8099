//! Field rendering utilities for forms

use crate::state::FieldKind;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Rows taken by one field: the bordered input plus its error line
pub const FIELD_HEIGHT: u16 = 4;

/// Draw one input box, with the field's error underneath when it has one
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    is_active: bool,
    kind: FieldKind,
    error: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let border_style = match (is_active, error.is_some()) {
        (true, _) => Style::default().fg(Color::Cyan),
        (false, true) => Style::default().fg(Color::Red),
        (false, false) => Style::default().fg(Color::DarkGray),
    };
    let value_style = match kind {
        FieldKind::Derived => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        _ if is_active => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    };

    let shown = if value.is_empty() && !is_active {
        "(vide)"
    } else {
        value
    };
    let mut spans = vec![Span::styled(shown, value_style)];
    if is_active {
        let marker = if kind == FieldKind::Choice { " ◂▸" } else { "▌" };
        spans.push(Span::styled(marker, Style::default().fg(Color::Cyan)));
    }

    let block = Block::default()
        .title(format!(" {label} "))
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[0]);

    if let Some(message) = error {
        let line = Paragraph::new(format!(" {message}")).style(Style::default().fg(Color::Red));
        frame.render_widget(line, chunks[1]);
    }
}
