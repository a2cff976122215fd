//! Task detail popup (view, edit and discard confirmation).

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::theme;
use crate::app::{App, FormField};
use crate::edit::EditState;

/// Render the detail view of the open task over `area`.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(guard) = app.detail() else {
        return;
    };
    let state = guard.state();
    let content = guard.content();
    let editing = matches!(state, EditState::Editing | EditState::ConfirmingDiscard);

    let status = app
        .board()
        .get(guard.task_id())
        .map_or_else(String::new, |t| t.status.to_string());
    let saving = app.engine().is_busy(guard.task_id());

    let field = |label: &'static str, value: &str, which: FormField| {
        let mut spans = vec![
            Span::styled(label, theme::bold()),
            Span::styled(value.to_string(), theme::normal()),
        ];
        if state == EditState::Editing && app.detail_field == which {
            spans.push(Span::styled("\u{2588}", theme::input_cursor()));
        }
        Line::from(spans)
    };

    let mut lines = vec![
        field("Title: ", &content.title, FormField::Title),
        Line::from(vec![
            Span::styled("Column: ", theme::bold()),
            Span::styled(status, theme::dimmed()),
        ]),
        Line::raw(""),
        field("Description: ", &content.description, FormField::Description),
        Line::raw(""),
    ];

    if saving {
        lines.push(Line::from(Span::styled("Saving\u{2026}", theme::pending())));
    }
    if guard.is_dirty() {
        lines.push(Line::from(Span::styled(
            "Unsaved changes",
            theme::normal().fg(theme::WARNING),
        )));
    }
    if state == EditState::ConfirmingDiscard {
        lines.push(Line::from(vec![
            Span::styled("Discard changes? ", theme::normal().fg(theme::ERROR)),
            Span::styled("y: discard | n: keep editing", theme::dimmed()),
        ]));
    }

    let title = if editing { " Edit task " } else { " Task " };
    let block = Block::default()
        .title(Span::styled(title, theme::highlighted()))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}
