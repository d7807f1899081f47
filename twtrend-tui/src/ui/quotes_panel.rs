//! Panel 1: code input, highlight cards for the first three quotes, and the
//! full quote table.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use twtrend_core::quote::QuoteRow;

use crate::app::{AppState, InputField};
use crate::theme;
use crate::ui::{input_line, thousands};

const HIGHLIGHTS: usize = 3;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let input = input_line("股票代號: ", &app.codes_input, InputField::Codes, app);
    f.render_widget(Paragraph::new(input), chunks[0]);

    let Some(snapshot) = &app.snapshot else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "按 i 輸入代號 (逗號分隔)，Enter 或 r 抓取報價",
                theme::muted(),
            )),
        ]);
        f.render_widget(hint, chunks[1]);
        return;
    };

    if snapshot.quotes.is_empty() {
        let msg = Paragraph::new(Span::styled(
            "沒有任何代號取得資料，按 v 查看警告",
            theme::warning(),
        ));
        f.render_widget(msg, chunks[1]);
    } else {
        render_highlights(f, chunks[1], &snapshot.quotes);
        render_table(f, chunks[2], &snapshot.quotes);
    }

    let footer = Line::from(vec![
        Span::styled("最後更新: ", theme::muted()),
        Span::styled(snapshot.updated_label(), theme::text()),
        Span::styled(format!("   {} 檔", snapshot.quotes.len()), theme::muted()),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[3]);
}

fn render_highlights(f: &mut Frame, area: Rect, quotes: &[QuoteRow]) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, HIGHLIGHTS as u32); HIGHLIGHTS])
        .split(area);

    for (q, card) in quotes.iter().take(HIGHLIGHTS).zip(cards.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::muted())
            .title(format!(" {} {} ", q.code, q.name))
            .title_style(theme::accent());
        let lines = vec![
            Line::from(Span::styled(format!("{:.2}", q.close), theme::accent_bold())),
            Line::from(Span::styled(
                format!("{} {:+.2} ({:+.2}%)", arrow(q), q.change, q.change_pct),
                theme::change(q.change),
            )),
            Line::from(Span::styled(q.date.to_string(), theme::muted())),
        ];
        f.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

/// Board-style direction marker.
pub fn arrow(q: &QuoteRow) -> &'static str {
    if q.is_up() {
        "▲"
    } else if q.is_down() {
        "▼"
    } else {
        "─"
    }
}

fn render_table(f: &mut Frame, area: Rect, quotes: &[QuoteRow]) {
    let header = Row::new(
        ["代號", "名稱", "日期", "收盤價", "漲跌", "漲跌幅(%)", "成交量"]
            .into_iter()
            .map(|h| Cell::from(h).style(theme::header())),
    );

    let rows: Vec<Row> = quotes
        .iter()
        .map(|q| {
            let style = theme::change(q.change);
            Row::new(vec![
                Cell::from(q.code.to_string()),
                Cell::from(q.name.clone()),
                Cell::from(q.date.to_string()).style(theme::muted()),
                Cell::from(format!("{:>10.2}", q.close)),
                Cell::from(format!("{:>+8.2}", q.change)).style(style),
                Cell::from(format!("{:>+8.2}", q.change_pct)).style(style),
                Cell::from(format!("{:>14}", thousands(q.volume))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(10),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(15),
    ];
    f.render_widget(Table::new(rows, widths).header(header), area);
}
