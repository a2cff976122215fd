//! Notification area rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, NoticeLevel};

/// Render the visible notices, one per line, oldest first.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let lines: Vec<Line> = app
        .notices
        .iter()
        .map(|notice| {
            let color = match notice.level {
                NoticeLevel::Info => theme::WARNING,
                NoticeLevel::Error => theme::ERROR,
            };
            Line::from(vec![
                Span::styled(notice.timestamp.as_str(), theme::timestamp()),
                Span::raw(" "),
                Span::styled(notice.text.as_str(), theme::normal().fg(color)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
