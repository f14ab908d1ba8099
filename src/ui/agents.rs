//! Agent list view

use super::render_scrollable_list;
use crate::app::App;
use crate::state::AGENT_ROLES;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

fn role_label(role: &str) -> &str {
    AGENT_ROLES
        .iter()
        .find(|(value, _)| *value == role)
        .map_or(role, |(_, label)| *label)
}

/// Draw the agent list
pub fn draw_list(frame: &mut Frame, area: Rect, app: &App) {
    let agents = app.state.sorted_agents();
    let block = Block::default()
        .title(format!(" Agents ({}) ", agents.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if agents.is_empty() {
        let content = Paragraph::new("Aucun agent.\nAppuyez sur 'n' pour en créer un.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items: Vec<ListItem> = agents
        .iter()
        .enumerate()
        .map(|(idx, agent)| {
            let is_selected = idx == app.state.selected_index;
            let prefix = if is_selected { "▸" } else { " " };
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(
                    format!("{:<12}", agent.identifiant),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(agent.full_name(), style),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", role_label(&agent.role)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("  {} · {}", agent.agence_nom, agent.statut.as_str()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(block);
    render_scrollable_list(frame, area, list, app.state.selected_index);
}
