//! Application state: single-owner, main-thread only.
//!
//! The worker thread communicates via channels. A finished refresh replaces
//! the snapshot wholesale; nothing in it is patched in place.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use twtrend_core::domain::parse_code_list;
use twtrend_core::export;
use twtrend_core::lookup::HistoryLookup;
use twtrend_core::trend::Horizon;
use twtrend_core::SessionSnapshot;

use crate::worker::{WorkerCommand, WorkerResponse};

const WARNING_HISTORY_CAP: usize = 100;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Quotes,
    Charts,
    Lookup,
    Help,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Quotes, Panel::Charts, Panel::Lookup, Panel::Help];

    pub fn index(self) -> usize {
        match self {
            Panel::Quotes => 0,
            Panel::Charts => 1,
            Panel::Lookup => 2,
            Panel::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Quotes => "即時報價",
            Panel::Charts => "走勢比較",
            Panel::Lookup => "歷史查詢",
            Panel::Help => "說明",
        }
    }

    pub fn next(self) -> Panel {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Panel {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub fn next_horizon(h: Horizon) -> Horizon {
    match h {
        Horizon::Weekly => Horizon::Monthly,
        Horizon::Monthly => Horizon::Yearly,
        Horizon::Yearly => Horizon::Weekly,
    }
}

pub fn prev_horizon(h: Horizon) -> Horizon {
    match h {
        Horizon::Weekly => Horizon::Yearly,
        Horizon::Monthly => Horizon::Weekly,
        Horizon::Yearly => Horizon::Monthly,
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// One entry in the warnings overlay.
#[derive(Debug, Clone)]
pub struct WarningRecord {
    pub timestamp: NaiveDateTime,
    pub source: &'static str,
    pub message: String,
}

/// Text field currently receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Codes,
    Date,
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Warnings,
}

/// Command the worker is running, with its latest progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub label: &'static str,
    pub current: Option<String>,
    pub done: usize,
    pub total: usize,
}

/// Top-level application state.
pub struct AppState {
    pub active_panel: Panel,
    pub running: bool,

    pub codes_input: String,
    pub date_input: String,
    pub editing: Option<InputField>,
    pub horizon: Horizon,

    pub snapshot: Option<SessionSnapshot>,
    pub lookup: Option<HistoryLookup>,
    pub pending: Option<Pending>,

    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    pub status_message: Option<(String, StatusLevel)>,
    pub warnings: VecDeque<WarningRecord>,
    pub warning_scroll: usize,
    pub overlay: Overlay,

    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        default_codes: &[String],
        today: NaiveDate,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::Quotes,
            running: true,
            codes_input: default_codes.join(","),
            date_input: today.format("%Y-%m-%d").to_string(),
            editing: None,
            horizon: Horizon::Weekly,
            snapshot: None,
            lookup: None,
            pending: None,
            worker_tx,
            worker_rx,
            status_message: None,
            warnings: VecDeque::with_capacity(WARNING_HISTORY_CAP),
            warning_scroll: 0,
            overlay: Overlay::None,
            export_dir,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Parse the codes field and ask the worker for a full refresh.
    pub fn request_refresh(&mut self) {
        if self.is_busy() {
            self.set_warning("仍在抓取資料，請稍候");
            return;
        }
        let codes = parse_code_list(&self.codes_input);
        if codes.is_empty() {
            self.set_warning("請輸入至少一個股票代號");
            return;
        }
        info!(codes = codes.len(), "refresh requested");
        self.send(WorkerCommand::Refresh { codes }, "refresh");
    }

    /// Parse the date field and ask the worker for a historical lookup.
    pub fn request_lookup(&mut self) {
        if self.is_busy() {
            self.set_warning("仍在抓取資料，請稍候");
            return;
        }
        let date = match NaiveDate::parse_from_str(self.date_input.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                self.set_warning(format!("日期格式錯誤: '{}' (YYYY-MM-DD)", self.date_input));
                return;
            }
        };
        let codes = parse_code_list(&self.codes_input);
        if codes.is_empty() {
            self.set_warning("請輸入至少一個股票代號");
            return;
        }
        self.send(WorkerCommand::Lookup { codes, date }, "lookup");
    }

    fn send(&mut self, cmd: WorkerCommand, label: &'static str) {
        if self.worker_tx.send(cmd).is_err() {
            self.push_warning("worker", "背景工作已停止".into());
            self.status_message = Some(("背景工作已停止".into(), StatusLevel::Error));
            return;
        }
        self.pending = Some(Pending {
            label,
            current: None,
            done: 0,
            total: 0,
        });
        self.set_status("正在抓取資料...");
    }

    /// Apply one worker response.
    pub fn handle_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::Progress { code, index, total } => {
                if let Some(p) = self.pending.as_mut() {
                    p.current = Some(code);
                    p.done = index;
                    p.total = total;
                }
            }
            WorkerResponse::RefreshDone(snapshot) => {
                self.pending = None;
                self.apply_snapshot(*snapshot);
            }
            WorkerResponse::LookupDone(result) => {
                self.pending = None;
                for w in &result.warnings {
                    self.push_warning("lookup", w.clone());
                }
                let msg = if result.is_empty() {
                    format!("{}: 無資料 (假日或尚未收盤)", result.date)
                } else {
                    format!("{}: {} 筆", result.date, result.rows.len())
                };
                self.set_status(msg);
                self.lookup = Some(*result);
            }
            WorkerResponse::Error { message, context } => {
                self.pending = None;
                warn!(%message, %context, "worker error");
                self.push_warning("worker", format!("{message} ({context})"));
                self.status_message = Some((message, StatusLevel::Error));
            }
        }
    }

    /// Replace the session snapshot with a newer one.
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        for w in &snapshot.warnings {
            self.push_warning("quote", w.clone());
        }
        let msg = format!(
            "更新完成: {} 檔 ({})",
            snapshot.quotes.len(),
            snapshot.updated_label()
        );
        if snapshot.warnings.is_empty() {
            self.set_status(msg);
        } else {
            self.set_warning(format!("{msg}，{} 則警告", snapshot.warnings.len()));
        }
        self.snapshot = Some(snapshot);
    }

    /// Write the current quote table to the export directory.
    pub fn export_quotes(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            self.set_warning("尚無報價可匯出");
            return;
        };
        let today = snapshot.updated_at.date();
        match export::export_quotes(&snapshot.quotes, &self.export_dir, None, today) {
            Ok(path) => {
                info!(path = %path.display(), "quotes exported");
                self.set_status(format!("已匯出 {}", path.display()));
            }
            Err(e) => {
                self.push_warning("export", e.to_string());
                self.status_message = Some((format!("匯出失敗: {e}"), StatusLevel::Error));
            }
        }
    }

    /// Push a warning to the history, newest first, capped.
    pub fn push_warning(&mut self, source: &'static str, message: String) {
        self.warnings.push_front(WarningRecord {
            timestamp: chrono::Local::now().naive_local(),
            source,
            message,
        });
        self.warnings.truncate(WARNING_HISTORY_CAP);
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::mpsc;

    use twtrend_core::market::GateVerdict;
    use twtrend_core::quote::QuoteRow;

    use super::*;

    fn app() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let today = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();
        let app = AppState::new(
            cmd_tx,
            resp_rx,
            &["2330".to_string(), "0050".to_string()],
            today,
            std::env::temp_dir(),
        );
        (app, cmd_rx, resp_tx)
    }

    fn snapshot(warnings: Vec<String>) -> SessionSnapshot {
        let date = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();
        SessionSnapshot {
            updated_at: date.and_hms_opt(14, 0, 0).unwrap(),
            quotes: vec![QuoteRow {
                code: "2330".into(),
                name: "台積電".into(),
                date,
                close: 1075.0,
                change: 5.0,
                change_pct: 0.47,
                volume: 12_345,
            }],
            tickers: Vec::new(),
            warnings,
            trends: BTreeMap::new(),
        }
    }

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Quotes.next(), Panel::Charts);
        assert_eq!(Panel::Help.next(), Panel::Quotes);
        assert_eq!(Panel::Quotes.prev(), Panel::Help);
        for (i, p) in Panel::ALL.iter().enumerate() {
            assert_eq!(Panel::from_index(i), Some(*p));
        }
        assert!(Panel::from_index(4).is_none());
    }

    #[test]
    fn horizon_cycle_visits_all() {
        let mut h = Horizon::Weekly;
        for expected in [Horizon::Monthly, Horizon::Yearly, Horizon::Weekly] {
            h = next_horizon(h);
            assert_eq!(h, expected);
        }
        assert_eq!(prev_horizon(Horizon::Weekly), Horizon::Yearly);
    }

    #[test]
    fn refresh_sends_parsed_codes_and_blocks_second_request() {
        let (mut app, cmd_rx, _resp_tx) = app();
        app.codes_input = "006208, 2317,,2353 ".into();
        app.request_refresh();
        match cmd_rx.try_recv() {
            Ok(WorkerCommand::Refresh { codes }) => {
                let codes: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
                assert_eq!(codes, vec!["006208", "2317", "2353"]);
            }
            other => panic!("expected Refresh, got {other:?}"),
        }
        assert!(app.is_busy());

        app.request_refresh();
        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Warning));
    }

    #[test]
    fn empty_codes_are_rejected_locally() {
        let (mut app, cmd_rx, _resp_tx) = app();
        app.codes_input = " , ".into();
        app.request_refresh();
        assert!(cmd_rx.try_recv().is_err());
        assert!(!app.is_busy());
    }

    #[test]
    fn bad_lookup_date_is_rejected_locally() {
        let (mut app, cmd_rx, _resp_tx) = app();
        app.date_input = "2024/12/09".into();
        app.request_lookup();
        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Warning));
    }

    #[test]
    fn refresh_done_replaces_snapshot_and_records_warnings() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.request_refresh();
        app.handle_response(WorkerResponse::RefreshDone(Box::new(snapshot(vec![
            "no data for 9999".into(),
        ]))));
        assert!(!app.is_busy());
        assert_eq!(app.warnings.len(), 1);
        assert_eq!(app.warnings[0].message, "no data for 9999");

        app.handle_response(WorkerResponse::RefreshDone(Box::new(snapshot(Vec::new()))));
        let snap = app.snapshot.as_ref().unwrap();
        assert!(snap.warnings.is_empty());
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Info));
    }

    #[test]
    fn gated_lookup_reports_no_data() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        let date = NaiveDate::from_ymd_opt(2024, 12, 14).unwrap();
        app.handle_response(WorkerResponse::LookupDone(Box::new(HistoryLookup {
            date,
            verdict: GateVerdict::FutureDate,
            rows: Vec::new(),
            missing: Vec::new(),
            warnings: Vec::new(),
        })));
        let (msg, _) = app.status_message.clone().unwrap();
        assert!(msg.contains("無資料"));
        assert!(app.lookup.is_some());
    }

    #[test]
    fn worker_error_clears_pending() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.request_refresh();
        app.handle_response(WorkerResponse::Error {
            message: "down".into(),
            context: "breaker".into(),
        });
        assert!(!app.is_busy());
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Error));
    }

    #[test]
    fn warning_history_is_capped() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        for i in 0..150 {
            app.push_warning("quote", format!("warning {i}"));
        }
        assert_eq!(app.warnings.len(), WARNING_HISTORY_CAP);
        assert!(app.warnings[0].message.contains("149"));
    }

    #[test]
    fn export_writes_bom_csv_named_after_update_date() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        let dir = tempfile::tempdir().unwrap();
        app.export_dir = dir.path().to_path_buf();

        app.export_quotes();
        assert_eq!(app.status_message.as_ref().map(|m| m.1), Some(StatusLevel::Warning));

        app.apply_snapshot(snapshot(Vec::new()));
        app.export_quotes();
        let written = std::fs::read_to_string(dir.path().join("stock_20241209.csv")).unwrap();
        assert!(written.starts_with(export::BOM));
        assert!(written.contains("2330"));
    }
}
