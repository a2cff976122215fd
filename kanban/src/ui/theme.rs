//! Theme and styling constants for the TUI.

use kanban_proto::Status;
use ratatui::style::{Color, Modifier, Style};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error indicator color.
pub const ERROR: Color = Color::Red;

/// Border color of the column a dragged card is over.
pub const DROP_TARGET: Color = Color::LightMagenta;

/// Title color for each board column.
#[must_use]
pub const fn column_color(status: Status) -> Color {
    match status {
        Status::Todo => Color::Blue,
        Status::InProgress => Color::Yellow,
        Status::Done => Color::Green,
    }
}

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (descriptions, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused panel borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Selected item style (in lists).
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// The card being carried.
#[must_use]
pub fn dragged() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(DROP_TARGET)
        .add_modifier(Modifier::BOLD | Modifier::ITALIC)
}

/// Border of the surface under a dragged card.
#[must_use]
pub fn drop_target() -> Style {
    Style::default()
        .fg(DROP_TARGET)
        .add_modifier(Modifier::BOLD)
}

/// Marker for cards with a request in flight.
#[must_use]
pub fn pending() -> Style {
    Style::default()
        .fg(WARNING)
        .add_modifier(Modifier::ITALIC)
}

/// Style for timestamps (dark gray).
#[must_use]
pub fn timestamp() -> Style {
    Style::default().fg(Color::Rgb(120, 120, 120))
}

/// Style for the input cursor (bright white, bold).
#[must_use]
pub fn input_cursor() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Style for the card count badge in column titles.
#[must_use]
pub fn count_badge() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .bg(Color::Rgb(30, 30, 50))
        .add_modifier(Modifier::BOLD)
}
