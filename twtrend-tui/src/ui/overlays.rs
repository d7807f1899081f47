//! Warning history overlay.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

pub fn render_warnings(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(format!(" 警告紀錄 ({}) [Esc]關閉 [j/k]捲動 ", app.warnings.len()))
        .title_style(theme::warning());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.warnings.is_empty() {
        f.render_widget(Paragraph::new(Span::styled("沒有警告", theme::muted())), inner);
        return;
    }

    let lines: Vec<Line> = app
        .warnings
        .iter()
        .enumerate()
        .skip(app.warning_scroll)
        .take(inner.height as usize)
        .map(|(i, w)| {
            let style = if i == app.warning_scroll {
                theme::warning().add_modifier(Modifier::BOLD)
            } else {
                theme::text()
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", w.timestamp.format("%H:%M:%S")), theme::muted()),
                Span::styled(format!("[{}] ", w.source), theme::accent()),
                Span::styled(w.message.as_str(), style),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
