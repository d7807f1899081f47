//! Panel 2: one line chart per horizon, percent change from each
//! security's own baseline.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use twtrend_core::trend::{AlignedTable, Horizon};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    render_selector(f, chunks[0], app.horizon);

    match app.snapshot.as_ref().and_then(|s| s.trend(app.horizon)) {
        Some(table) if !table.is_empty() => render_chart(f, chunks[1], table),
        Some(_) => render_message(f, chunks[1], "此區間尚無資料"),
        None => render_message(f, chunks[1], "尚未抓取資料，按 r 更新"),
    }
}

fn render_selector(f: &mut Frame, area: Rect, active: Horizon) {
    let mut spans = Vec::new();
    for (key, h) in ["w", "m", "y"].into_iter().zip(Horizon::ALL) {
        let style = if h == active {
            theme::accent_bold()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!("[{key}] {}  ", h.short_name()), style));
    }
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(active.title(), theme::text())),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_message(f: &mut Frame, area: Rect, msg: &str) {
    let lines = vec![Line::from(""), Line::from(Span::styled(msg, theme::muted()))];
    f.render_widget(Paragraph::new(lines), area);
}

/// Y bounds padded by 5% of the range, always containing zero.
pub fn y_bounds(table: &AlignedTable) -> [f64; 2] {
    let (lo, hi) = table.value_bounds().unwrap_or((0.0, 0.0));
    let (lo, hi) = (lo.min(0.0), hi.max(0.0));
    let pad = ((hi - lo) * 0.05).max(0.5);
    [lo - pad, hi + pad]
}

fn render_chart(f: &mut Frame, area: Rect, table: &AlignedTable) {
    let points: Vec<Vec<(f64, f64)>> = (0..table.columns.len()).map(|c| table.points(c)).collect();
    let names: Vec<String> = table.columns.iter().map(|t| t.label()).collect();

    let datasets: Vec<Dataset> = points
        .iter()
        .zip(names.iter())
        .enumerate()
        .map(|(i, (data, name))| {
            Dataset::default()
                .name(name.as_str())
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(theme::series_color(i)))
                .graph_type(GraphType::Line)
                .data(data)
        })
        .collect();

    let x_max = table.rows.len().saturating_sub(1) as f64;
    let first = table.rows.first().map(|r| r.label.clone()).unwrap_or_default();
    let last = table.rows.last().map(|r| r.label.clone()).unwrap_or_default();
    let [y_min, y_max] = y_bounds(table);

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled(first, theme::muted()),
                    Span::styled(last, theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("%", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.1}"), theme::muted()),
                    Span::styled("0", theme::muted()),
                    Span::styled(format!("{y_max:.1}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use twtrend_core::domain::ValidTicker;
    use twtrend_core::trend::AlignedRow;

    use super::*;

    fn table(values: &[Option<f64>]) -> AlignedTable {
        let day = NaiveDate::from_ymd_opt(2024, 12, 2).unwrap();
        AlignedTable {
            horizon: Horizon::Monthly,
            columns: vec![ValidTicker::new("2330".into(), "台積電")],
            rows: values
                .iter()
                .enumerate()
                .map(|(i, v)| AlignedRow {
                    at: (day + chrono::Days::new(i as u64)).and_hms_opt(13, 30, 0).unwrap(),
                    label: format!("12/{:02}", i + 2),
                    values: vec![*v],
                })
                .collect(),
        }
    }

    #[test]
    fn bounds_include_zero_and_padding() {
        let [lo, hi] = y_bounds(&table(&[Some(0.0), Some(4.0), Some(10.0)]));
        assert!(lo < 0.0);
        assert!(hi > 10.0);
    }

    #[test]
    fn bounds_for_flat_table_are_not_degenerate() {
        let [lo, hi] = y_bounds(&table(&[Some(0.0), None]));
        assert!(hi - lo >= 1.0);
    }
}
