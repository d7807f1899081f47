//! Panel 3: price history for one date.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use twtrend_core::lookup::HistoryLookup;
use twtrend_core::market::GateVerdict;

use crate::app::{AppState, InputField};
use crate::theme;
use crate::ui::{input_line, thousands};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(3),
        ])
        .split(area);

    let input = input_line("查詢日期: ", &app.date_input, InputField::Date, app);
    f.render_widget(Paragraph::new(input), chunks[0]);

    match &app.lookup {
        None => {
            let hint = Span::styled(
                "按 i 編輯日期 (YYYY-MM-DD)，Enter 查詢報價欄位中的代號",
                theme::muted(),
            );
            f.render_widget(Paragraph::new(Line::from(hint)), chunks[1]);
        }
        Some(result) => {
            f.render_widget(Paragraph::new(summary(result)), chunks[1]);
            if !result.is_empty() {
                render_rows(f, chunks[2], result);
            }
        }
    }
}

fn summary(result: &HistoryLookup) -> Vec<Line<'static>> {
    let head = match result.verdict {
        GateVerdict::FutureDate => {
            Span::styled(format!("{}: 未來日期，尚無資料", result.date), theme::warning())
        }
        GateVerdict::SessionNotClosed => Span::styled(
            format!("{}: 今日尚未收盤 (13:30)，尚無資料", result.date),
            theme::warning(),
        ),
        GateVerdict::Displayable if result.is_empty() => Span::styled(
            format!("{}: 無資料 (假日或尚未收盤)", result.date),
            theme::warning(),
        ),
        GateVerdict::Displayable => Span::styled(
            format!("{}: {} 筆", result.date, result.rows.len()),
            theme::accent(),
        ),
    };

    let mut lines = vec![Line::from(head)];
    if !result.missing.is_empty() {
        let codes: Vec<String> = result.missing.iter().map(|c| c.to_string()).collect();
        lines.push(Line::from(Span::styled(
            format!("當日無交易: {}", codes.join(", ")),
            theme::muted(),
        )));
    }
    lines
}

fn render_rows(f: &mut Frame, area: Rect, result: &HistoryLookup) {
    let header = Row::new(
        ["代號", "名稱", "時間", "開盤", "最高", "最低", "收盤", "成交量"]
            .into_iter()
            .map(|h| Cell::from(h).style(theme::header())),
    );
    let rows: Vec<Row> = result
        .rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.code.to_string()),
                Cell::from(r.name.clone()),
                Cell::from(r.timestamp.clone()).style(theme::muted()),
                Cell::from(format!("{:>9.2}", r.open)),
                Cell::from(format!("{:>9.2}", r.high)),
                Cell::from(format!("{:>9.2}", r.low)),
                Cell::from(format!("{:>9.2}", r.close)).style(theme::change(r.close - r.open)),
                Cell::from(format!("{:>14}", thousands(r.volume))),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Min(10),
        Constraint::Length(17),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(15),
    ];
    f.render_widget(Table::new(rows, widths).header(header), area);
}
