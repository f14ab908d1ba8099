//! Reusable UI widget helpers

use crate::state::TransferStatus;
use ratatui::{
    layout::Rect,
    style::Color,
    widgets::{List, ListState},
    Frame,
};

/// Render a scrollable list that keeps the selected item visible
pub fn render_scrollable_list(frame: &mut Frame, area: Rect, list: List, selected_index: usize) {
    let mut list_state = ListState::default().with_selected(Some(selected_index));
    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn status_color(status: TransferStatus) -> Color {
    match status {
        TransferStatus::EnAttente => Color::Yellow,
        TransferStatus::Valide => Color::Green,
        TransferStatus::Rejete => Color::Red,
    }
}

/// Whole amount with thin thousands separators: `1 250 000`
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
