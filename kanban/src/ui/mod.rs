//! Terminal UI rendering.

pub mod board;
pub mod detail;
pub mod notices;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::app::App;

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Board on top, notices (if any) above the status bar
    let notice_height = u16::try_from(app.notices.len()).unwrap_or(u16::MAX);
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(notice_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    board::render(frame, main_chunks[0], app);
    notices::render(frame, main_chunks[1], app);
    status_bar::render(frame, main_chunks[2], app);

    // Detail view floats over the board
    if app.detail().is_some() {
        detail::render(frame, centered(frame.area(), 60, 50), app);
    }
}

/// A rectangle of `percent_x` by `percent_y` centered in `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
