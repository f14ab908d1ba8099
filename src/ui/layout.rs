//! Layout components (sidebar, status bar)

use super::components::{render_sidebar_button, BUTTON_HEIGHT};
use crate::app::App;
use crate::platform::CONFIRM_SHORTCUT;
use crate::state::View;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Sidebar items: shortcut, label
const SIDEBAR_ITEMS: &[(&str, &str)] = &[("t", "Transferts"), ("a", "Agents")];

/// Create the main layout with sidebar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20), // Sidebar
            Constraint::Min(0),     // Main content
        ])
        .split(area);

    // Reserve bottom line for status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(chunks[1]);

    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(chunks[0]);

    (sidebar_chunks[0], main_chunks[0])
}

/// Draw the sidebar with boxed buttons
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                // Top padding (flex)
            Constraint::Length(BUTTON_HEIGHT), // Transfers
            Constraint::Length(BUTTON_HEIGHT), // Agents
            Constraint::Min(0),                // Bottom padding (flex)
        ])
        .split(area);

    // Navigation is locked while a wizard is open
    let in_wizard = app.state.current_view.is_form();

    for (idx, (key, label)) in SIDEBAR_ITEMS.iter().enumerate() {
        let is_selected = match idx {
            0 => matches!(
                app.state.current_view,
                View::Transfers | View::TransferCreate
            ),
            _ => matches!(app.state.current_view, View::Agents | View::AgentCreate),
        };
        render_sidebar_button(frame, chunks[idx + 1], key, label, is_selected, !in_wizard);
    }
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let mut spans = vec![];

    // Busy indicator
    if app.is_submitting() {
        spans.push(Span::styled(
            " ⏳ envoi… ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled(" ● ", Style::default().fg(Color::Green)));
    }

    // View-specific hints
    let hints = get_view_hints(app);
    spans.push(Span::styled(hints, Style::default().fg(Color::Gray)));

    if let Some(msg) = &app.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);

    // Currency and quit hint on the right
    let right = format!(" {} | ^C:quitter ", app.config().currency());
    let width = right.chars().count() as u16;
    let right_area = Rect {
        x: area.width.saturating_sub(width),
        y: area.height.saturating_sub(1),
        width: width.min(area.width),
        height: 1,
    };
    let right_widget =
        Paragraph::new(right).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(right_widget, right_area);
}

/// Get keyboard hints for the current view
fn get_view_hints(app: &App) -> String {
    let form = &app.state.form;
    match app.state.current_view {
        View::Transfers => {
            "j/k:nav  n:nouveau  v:valider  r:rejeter  y:copier code  f:filtre  Tab:agents"
                .to_string()
        }
        View::Agents => "j/k:nav  n:nouvel agent  Tab:transferts".to_string(),
        View::TransferCreate | View::AgentCreate if form.is_busy() => {
            "Esc:annuler l'envoi".to_string()
        }
        View::TransferCreate | View::AgentCreate if form.is_summary() => {
            format!("{CONFIRM_SHORTCUT}:confirmer  Esc:modifier")
        }
        View::TransferCreate | View::AgentCreate => {
            let back = if form.is_on_first_step() {
                "Esc:quitter"
            } else {
                "Esc:précédent"
            };
            format!("Tab:champ  ←/→:choix  Enter:suivant  {back}")
        }
    }
}
