//! Error dialog component

use super::base::{render_dialog, DialogConfig};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    Frame,
};

fn title(pending: usize) -> String {
    if pending > 1 {
        format!("Erreur ({} en attente)", pending - 1)
    } else {
        "Erreur".to_string()
    }
}

/// Render the oldest queued error centered on the screen.
///
/// `queued` counts every error still waiting, this one included.
pub fn render_error_dialog(frame: &mut Frame, error_message: &str, queued: usize) {
    let key = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let hint = vec![
        Span::styled("Entrée", key),
        Span::raw(" ou "),
        Span::styled("Échap", key),
        Span::raw(" pour fermer"),
    ];
    let title = title(queued);

    render_dialog(
        frame,
        DialogConfig {
            title: &title,
            title_color: Color::Red,
            border_color: Color::Red,
            message: error_message,
            hint: Some(hint),
            max_width: 60,
        },
    );
}
