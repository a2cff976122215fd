//! Board rendering: three columns of cards plus the inline create form.

use kanban_proto::{Status, Task};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::theme;
use crate::app::{App, CreateForm, FormField, InputMode};
use crate::board::DropTarget;

/// Render the three board columns side by side.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for status in Status::ALL {
        render_column(frame, chunks[status.index()], app, status);
    }
}

fn render_column(frame: &mut Frame, area: Rect, app: &App, status: Status) {
    let form = app.create_form().filter(|f| f.column == status);
    let (cards_area, form_area) = if form.is_some() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)])
            .split(area);
        (split[0], Some(split[1]))
    } else {
        (area, None)
    };

    let tasks = app.visible_tasks(status);
    let focused = app.column == status;
    let drop_here = app.drag().and_then(|d| d.over()).is_some_and(|over| match over {
        DropTarget::Column(c) => *c == status,
        DropTarget::Card(id) => tasks.iter().any(|t| &t.id == id),
    });

    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| card_item(app, task, focused && i == app.card))
        .collect();

    let title = Line::from(vec![
        Span::styled(
            format!(" {status} "),
            theme::panel_title(theme::column_color(status)),
        ),
        Span::styled(format!(" {} ", tasks.len()), theme::count_badge()),
    ]);
    let border_style = if drop_here {
        theme::drop_target()
    } else if focused {
        theme::highlighted()
    } else {
        theme::normal()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(List::new(items).block(block), cards_area);

    if let (Some(form), Some(form_area)) = (form, form_area) {
        render_form(frame, form_area, form);
    }
}

fn card_item<'a>(app: &App, task: &'a Task, is_cursor: bool) -> ListItem<'a> {
    let dragging = app.drag().is_some_and(|d| d.task_id() == &task.id);
    let style = if dragging {
        theme::dragged()
    } else if is_cursor && app.input_mode() != InputMode::Dragging {
        theme::selected()
    } else {
        theme::normal()
    };

    let mut title = vec![Span::styled(task.title.as_str(), style)];
    if app.engine().is_busy(&task.id) {
        title.push(Span::styled(" \u{22ef}", theme::pending()));
    }
    let mut lines = vec![Line::from(title)];
    if !task.description_text().is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {}", task.description_text()),
            theme::dimmed(),
        )));
    }
    ListItem::new(lines)
}

fn render_form(frame: &mut Frame, area: Rect, form: &CreateForm) {
    let field_line = |label: &'static str, value: &str, field: FormField| {
        let active = form.field == field;
        let mut spans = vec![
            Span::styled(label, theme::dimmed()),
            Span::styled(value.to_string(), theme::normal()),
        ];
        if active {
            spans.push(Span::styled("\u{2588}", theme::input_cursor()));
        }
        Line::from(spans)
    };

    let lines = vec![
        field_line("Title: ", &form.title, FormField::Title),
        field_line("Desc:  ", &form.description, FormField::Description),
    ];
    let title = if form.pending.is_some() {
        "New task (saving\u{2026})"
    } else {
        "New task"
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::highlighted());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
