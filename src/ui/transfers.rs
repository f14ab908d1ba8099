//! Transfer list view

use super::render_scrollable_list;
use super::widgets::{format_amount, status_color};
use crate::app::App;
use crate::state::TransferPayload;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Draw the transfer list with the selected transfer's details
pub fn draw_list(frame: &mut Frame, area: Rect, app: &App) {
    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(42)])
        .split(area);

    draw_list_content(frame, h_chunks[0], app);
    draw_detail(frame, h_chunks[1], app);
}

fn draw_list_content(frame: &mut Frame, area: Rect, app: &App) {
    let transfers = app.state.visible_transfers();
    let title = format!(
        " Transferts ({}) - {} ",
        transfers.len(),
        app.state.status_filter.label()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if transfers.is_empty() {
        let content = Paragraph::new("Aucun transfert.\nAppuyez sur 'n' pour en créer un.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items: Vec<ListItem> = transfers
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            let is_selected = idx == app.state.selected_index;
            let prefix = if is_selected { "▸" } else { " " };
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            let line = Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(&t.code_retrait, Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", t.statut.label()),
                    Style::default().fg(status_color(t.statut)),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("{} → {}", t.sender_name(), t.recipient_name()),
                    style,
                ),
                Span::styled(
                    format!("  {} {}", format_amount(t.total), t.devise),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(block);
    render_scrollable_list(frame, area, list, app.state.selected_index);
}

fn draw_detail(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Détail ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(t) = app.state.selected_transfer() else {
        frame.render_widget(block, area);
        return;
    };

    let paragraph = Paragraph::new(detail_lines(t))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn detail_lines(t: &TransferPayload) -> Vec<Line<'_>> {
    let label = Style::default().fg(Color::DarkGray);
    let row = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("{name:<12}"), label), Span::raw(value)])
    };
    vec![
        Line::from(Span::styled(
            t.code_retrait.as_str(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("Statut", t.statut.label().to_string()),
        row("Créé le", t.date_creation.format("%d/%m/%Y %H:%M").to_string()),
        Line::from(""),
        row("Expéditeur", t.sender_name()),
        row("Téléphone", t.expediteur.telephone.clone()),
        row("Destinataire", t.recipient_name()),
        row("Téléphone", t.destinataire.telephone.clone()),
        row(
            "Agence",
            format!("{} ({})", t.destinataire.agence_nom, t.destinataire.pays),
        ),
        Line::from(""),
        row("Montant", format!("{} {}", format_amount(t.montant), t.devise)),
        row("Frais", format!("{} {}", format_amount(t.frais), t.devise)),
        row("Total", format!("{} {}", format_amount(t.total), t.devise)),
        row("Motif", t.motif.clone()),
    ]
}
