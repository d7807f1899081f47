//! Top-level UI layout: tab bar, active panel, status bar.

pub mod chart_panel;
pub mod help_panel;
pub mod lookup_panel;
pub mod overlays;
pub mod quotes_panel;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, InputField, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, chunks[0], app);
    draw_panel(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    if app.overlay == Overlay::Warnings {
        overlays::render_warnings(f, chunks[1], app);
    }
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(" twtrend ", theme::accent_bold())];
    for p in Panel::ALL {
        let style = theme::panel_title(p == app.active_panel);
        spans.push(Span::styled(format!(" {}:{} ", p.index() + 1, p.label()), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Quotes => quotes_panel::render(f, inner, app),
        Panel::Charts => chart_panel::render(f, inner, app),
        Panel::Lookup => lookup_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

/// One-line text field, with a cursor when it is being edited.
pub fn input_line<'a>(label: &'a str, value: &'a str, field: InputField, app: &AppState) -> Line<'a> {
    let editing = app.editing == Some(field);
    let value_style = if editing { theme::accent_bold() } else { theme::text() };
    let mut spans = vec![
        Span::styled(label, theme::muted()),
        Span::styled(value, value_style),
    ];
    if editing {
        spans.push(Span::styled("_", theme::accent()));
        spans.push(Span::styled("  [Enter]送出 [Esc]取消", theme::muted()));
    }
    Line::from(spans)
}

/// Format an integer with thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
