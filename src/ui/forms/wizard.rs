//! Multi-step wizard rendering

use super::field_renderer::{draw_field, FIELD_HEIGHT};
use crate::platform::CONFIRM_SHORTCUT;
use crate::state::wizard::{StepId, Submittable, WizardForm};
use crate::state::{Agency, FieldKind, FieldPath, WizardSession};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const SUMMARY_LABEL: &str = "Récapitulatif";

/// Draw a wizard session: step indicator, then the current step or the summary
pub fn draw_wizard<F: Submittable>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    session: &WizardSession<F>,
    agencies: &[Agency],
) {
    let border_color = if session.is_busy() {
        Color::Yellow
    } else {
        Color::Cyan
    };
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Step indicator
            Constraint::Min(0),    // Fields or summary
        ])
        .horizontal_margin(1)
        .split(inner);

    frame.render_widget(Paragraph::new(step_indicator(session)), chunks[0]);

    match session.wizard.current_step() {
        Some(step) => draw_step(frame, chunks[1], session, step, agencies),
        None => draw_summary(frame, chunks[1], session, agencies),
    }
}

fn step_indicator<F: Submittable>(session: &WizardSession<F>) -> Line<'static> {
    let current = session.wizard.current_step();
    let mut spans = Vec::new();
    let labels = F::Step::ALL
        .iter()
        .map(|s| (Some(*s), s.label()))
        .chain(std::iter::once((None, SUMMARY_LABEL)));

    for (idx, (step, label)) in labels.enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let is_current = step == current;
        let is_done = match (step, current) {
            (Some(s), Some(c)) => s.index() < c.index(),
            (Some(_), None) => true,
            (None, _) => false,
        };
        let style = if is_current {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if is_done {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{}. {label}", idx + 1), style));
    }
    Line::from(spans)
}

fn draw_step<F: Submittable>(
    frame: &mut Frame,
    area: Rect,
    session: &WizardSession<F>,
    step: F::Step,
    agencies: &[Agency],
) {
    let fields = F::fields(step);
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(FIELD_HEIGHT))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let form = session.wizard.form();
    let active = session.active_field();
    for (field, row) in fields.iter().zip(rows.iter()) {
        draw_field(
            frame,
            *row,
            field.label(),
            &display_value(form, *field, agencies),
            active == Some(*field),
            field.kind(),
            session.wizard.errors().get(*field),
        );
    }
}

fn draw_summary<F: Submittable>(
    frame: &mut Frame,
    area: Rect,
    session: &WizardSession<F>,
    agencies: &[Agency],
) {
    let form = session.wizard.form();
    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::DarkGray);

    let mut lines = Vec::new();
    for step in F::Step::ALL {
        lines.push(Line::from(Span::styled(step.label(), heading)));
        for field in F::fields(*step) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<22}", field.label()), label_style),
                Span::raw(display_value(form, *field, agencies)),
            ]));
        }
        lines.push(Line::from(""));
    }

    if session.is_busy() {
        lines.push(Line::from(Span::styled(
            "Envoi en cours… Échap pour annuler",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled(CONFIRM_SHORTCUT, heading),
            Span::raw(" pour confirmer, Échap pour corriger"),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

/// Text shown for a field: secrets masked, choices by their label
fn display_value<F: WizardForm>(form: &F, field: F::Field, agencies: &[Agency]) -> String {
    let value = form.value(field);
    match field.kind() {
        FieldKind::Secret => "•".repeat(value.chars().count()),
        FieldKind::Choice if !value.is_empty() => form
            .choices(field, agencies)
            .into_iter()
            .find(|c| c.value == value)
            .map_or(value, |c| c.label),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        AccountField, AgentField, AgentForm, RecipientField, TransferField, TransferForm,
    };

    fn agencies() -> Vec<Agency> {
        vec![Agency::new("AG-BKO-01", "Bamako Centre", "Mali", "Bamako")]
    }

    #[test]
    fn test_secret_is_masked() {
        let mut form = AgentForm::default();
        let field = AgentField::Compte(AccountField::MotDePasse);
        form.apply(field, "s3cretpass");
        assert_eq!(display_value(&form, field, &[]), "••••••••••");
    }

    #[test]
    fn test_choice_shows_label() {
        let agencies = agencies();
        let mut form = TransferForm::default();
        let field = TransferField::Destinataire(RecipientField::Agence);
        form.select(field, "AG-BKO-01", &agencies);
        assert_eq!(display_value(&form, field, &agencies), "Bamako Centre (Bamako)");
    }

    #[test]
    fn test_unknown_choice_falls_back_to_value() {
        let mut form = TransferForm::default();
        let field = TransferField::Destinataire(RecipientField::Agence);
        form.apply(field, "AG-XXX");
        assert_eq!(display_value(&form, field, &agencies()), "AG-XXX");
    }
}
