//! View
//!
//! Draws a [`TerminalScreen`] with ratatui. The device's status bar is
//! measured in device pixels; the terminal gets two rows for it, one for
//! the status text and one for the progress sweep, scaled to the terminal
//! width.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame as TerminalFrame;
use unicode_width::UnicodeWidthStr;

use checksync_core::{Frame, ItemIcon, StatusBarLayout};

use crate::screen::TerminalScreen;

/// Accent color for the status bar
const ACCENT: Color = Color::Rgb(255, 127, 127);

/// Key help shown at the bottom
const HELP: &str = "↑/↓ move · Enter toggle · r resend · q quit";

/// How far the status line has slid into view (0.0 hidden, 1.0 shown)
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn status_reveal(frame: Frame, layout: StatusBarLayout) -> f32 {
    if layout.height <= 0 {
        return 0.0;
    }
    ((frame.y + layout.height) as f32 / layout.height as f32).clamp(0.0, 1.0)
}

/// Columns covered by the progress bar, as `(start, width)`
///
/// `None` while the bar is entirely off the status bar.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn progress_span(frame: Frame, layout: StatusBarLayout, columns: u16) -> Option<(u16, u16)> {
    let left = frame.x.max(0);
    let right = (frame.x + frame.w).min(layout.width);
    if right <= left || layout.width <= 0 {
        return None;
    }

    let scale = f32::from(columns) / layout.width as f32;
    let start = (left as f32 * scale).floor() as u16;
    let end = ((right as f32 * scale).ceil() as u16).min(columns);
    (end > start).then(|| (start, end - start))
}

/// Draw the whole screen
pub fn draw(frame: &mut TerminalFrame<'_>, screen: &TerminalScreen, selected: usize) {
    let [status_area, sweep_area, list_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_status(frame, screen, status_area);
    draw_sweep(frame, screen, sweep_area);
    draw_list(frame, screen, selected, list_area);

    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        help_area,
    );
}

fn draw_status(frame: &mut TerminalFrame<'_>, screen: &TerminalScreen, area: Rect) {
    let reveal = status_reveal(screen.status_frame(), screen.layout());
    let style = if reveal < 0.34 {
        return;
    } else if reveal < 0.67 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    };

    let text = screen.status_text();
    let pad = usize::from(area.width).saturating_sub(text.width()) / 2;
    let line = Line::from(vec![Span::raw(" ".repeat(pad)), Span::styled(text, style)]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_sweep(frame: &mut TerminalFrame<'_>, screen: &TerminalScreen, area: Rect) {
    let Some((start, width)) = progress_span(screen.progress_frame(), screen.layout(), area.width)
    else {
        return;
    };

    let bar = Rect::new(area.x + start, area.y, width, 1);
    frame.render_widget(
        Paragraph::new("━".repeat(usize::from(width))).style(Style::default().fg(ACCENT)),
        bar,
    );
}

fn draw_list(frame: &mut TerminalFrame<'_>, screen: &TerminalScreen, selected: usize, area: Rect) {
    let items: Vec<ListItem<'_>> = screen
        .records()
        .iter()
        .map(|record| {
            let mark = match record.icon {
                ItemIcon::CheckMark => "[x] ",
                ItemIcon::None => "[ ] ",
            };
            ListItem::new(format!("{mark}{}", record.label))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title(screen.title().to_string()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if !screen.records().is_empty() {
        state.select(Some(selected.min(screen.records().len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
