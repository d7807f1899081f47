//! Bottom status bar: fetch progress or the last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, Pending, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = vec![Span::styled(" r:更新 e:匯出 v:警告 q:離開", theme::muted())];

    if !app.warnings.is_empty() {
        spans.push(Span::styled(format!(" [{}]", app.warnings.len()), theme::warning()));
    }
    spans.push(Span::raw(" | "));

    if let Some(p) = &app.pending {
        spans.push(Span::styled(progress_text(p), theme::accent()));
    } else if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::error(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn progress_text(p: &Pending) -> String {
    match &p.current {
        Some(code) => format!("{} [{}/{}] 正在抓取: {code} ...", p.label, p.done + 1, p.total),
        None => format!("{} ...", p.label),
    }
}
