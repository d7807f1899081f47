//! Panel 4: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "全域");
    key(&mut lines, "1-4", "切換面板");
    key(&mut lines, "Tab / Shift+Tab", "下一個 / 上一個面板");
    key(&mut lines, "r", "重新抓取報價與走勢");
    key(&mut lines, "e", "匯出報價 CSV (stock_YYYYMMDD.csv)");
    key(&mut lines, "v", "警告紀錄");
    key(&mut lines, "q / Ctrl+C", "離開");
    lines.push(Line::from(""));

    section(&mut lines, "1 即時報價");
    key(&mut lines, "i / Enter", "編輯股票代號 (逗號或空白分隔)");
    key(&mut lines, "", "前三檔以卡片顯示，上漲紅色、下跌綠色");
    lines.push(Line::from(""));

    section(&mut lines, "2 走勢比較");
    key(&mut lines, "h / l", "切換週 / 月 / 年");
    key(&mut lines, "w / m / y", "直接選擇週 / 月 / 年");
    key(&mut lines, "", "每條線以該股票自己的第一筆價格為 0%");
    lines.push(Line::from(""));

    section(&mut lines, "3 歷史查詢");
    key(&mut lines, "i", "編輯日期 (YYYY-MM-DD)");
    key(&mut lines, "Enter", "查詢報價欄位中的代號");
    key(&mut lines, "", "未來日期或今日 13:30 前不顯示資料");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {keys:>16}  "), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
