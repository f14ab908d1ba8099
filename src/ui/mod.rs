//! UI module for rendering the TUI

mod agents;
mod components;
mod forms;
mod layout;
mod transfers;
mod widgets;

use crate::app::App;
use crate::state::{FormState, View};
use components::render_error_dialog;
use ratatui::Frame;
use widgets::render_scrollable_list;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Draw the main layout with sidebar
    let (sidebar_area, main_area) = layout::create_layout(area);

    // Draw sidebar
    layout::draw_sidebar(frame, sidebar_area, app);

    // Draw main content based on current view
    match (&app.state.current_view, &app.state.form) {
        (View::Transfers, _) => transfers::draw_list(frame, main_area, app),
        (View::Agents, _) => agents::draw_list(frame, main_area, app),
        (View::TransferCreate, FormState::Transfer(session)) => forms::draw_wizard(
            frame,
            main_area,
            View::TransferCreate.title(),
            &**session,
            &app.state.agencies,
        ),
        (View::AgentCreate, FormState::Agent(session)) => forms::draw_wizard(
            frame,
            main_area,
            View::AgentCreate.title(),
            &**session,
            &app.state.agencies,
        ),
        _ => {}
    }

    // Draw status bar
    layout::draw_status_bar(frame, app);

    // Error queue overlays everything
    if let Some(error) = app.state.current_error() {
        render_error_dialog(frame, error, app.state.error_queue.len());
    }
}
