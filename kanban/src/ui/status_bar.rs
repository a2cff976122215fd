//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, InputMode};
use crate::edit::EditState;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.input_mode() {
        InputMode::Board => {
            "←→↑↓: move | Space: pick up | Enter: open | n: new | d: delete | /: search | r: reload | q: quit"
        }
        InputMode::Dragging => "←→↑↓: carry | Enter/Space: drop | Esc: cancel",
        InputMode::Creating => "Enter: create | Tab: switch field | Esc: cancel",
        InputMode::Search => "Enter: apply | Esc: clear",
        InputMode::Detail => match app.detail().map(crate::edit::EditGuard::state) {
            Some(EditState::Editing) => "Ctrl-S: save | Ctrl-R: revert | Tab: switch field | Esc: close",
            Some(EditState::ConfirmingDiscard) => "y: discard | n: keep editing",
            _ => "e: edit | Esc: close",
        },
    };

    let pending = app.engine().pending_count();
    let (dot_color, sync_text) = if !app.loaded || app.engine().is_loading() {
        (theme::WARNING, "Loading...".to_string())
    } else if pending > 0 {
        (theme::WARNING, format!("{pending} pending"))
    } else {
        (theme::SUCCESS, "Synced".to_string())
    };

    let mut spans = vec![
        Span::styled("Kanban", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {} ({sync_text})", app.store_label)),
    ];
    if app.searching || !app.search.is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(format!("/{}", app.search), theme::highlighted()));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
