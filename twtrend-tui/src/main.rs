//! twtrend TUI: interactive session over Taiwan-listed securities.
//!
//! Panels:
//! 1. Quotes: code input, highlight cards, quote table, last update time
//! 2. Charts: weekly / monthly / yearly percent-change lines
//! 3. Lookup: prices on one date, gated on session close
//! 4. Help: keyboard shortcuts

mod app;
mod input;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use twtrend_core::data::{CircuitBreaker, DataProvider, MemoryProvider, NameDirectory, YahooProvider};
use twtrend_core::logging::{init_logging, LoggingConfig};
use twtrend_core::market::{MarketClock, SessionGate};
use twtrend_core::{AppConfig, Refresher};

use crate::app::AppState;
use crate::worker::{WorkerCommand, WorkerContext};

#[derive(Parser)]
#[command(name = "twtrend-tui", version, about = "Interactive Taiwan stock trend session")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve bars from a CSV file (code,date,open,high,low,close,volume) instead of Yahoo.
    #[arg(long)]
    bars_csv: Option<PathBuf>,

    /// Fixed exchange-local "now", YYYY-MM-DDTHH:MM.
    #[arg(long)]
    as_of: Option<String>,

    /// Directory for CSV exports.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig::file_from_env(
        std::env::temp_dir().join("twtrend-tui.log"),
    ))?;

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let ctx = worker_context(&args, &config)?;
    let today = ctx.clock.today();
    info!(provider = ctx.provider.name(), names = %ctx.names.secondary.describe(), "session ready");

    // Restore the terminal before the default hook prints the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle =
        worker::spawn_worker(ctx, cmd_rx, resp_tx).context("failed to spawn worker thread")?;

    let mut app = AppState::new(
        cmd_tx.clone(),
        resp_rx,
        &config.session.default_codes,
        today,
        args.export_dir.clone(),
    );
    app.request_refresh();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    drop(app);
    let _ = worker_handle.join();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn worker_context(args: &Args, config: &AppConfig) -> Result<WorkerContext> {
    let exchange = config.exchange.resolve()?;

    let clock = match args.as_of.as_deref() {
        Some(raw) => {
            let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                .with_context(|| format!("invalid --as-of '{raw}' (expected YYYY-MM-DDTHH:MM)"))?;
            MarketClock::fixed_local(exchange.clone(), local)
                .with_context(|| format!("--as-of '{raw}' does not exist in {}", exchange.tz))?
        }
        None => MarketClock::new(exchange.clone()),
    };

    let provider: Box<dyn DataProvider> = match &args.bars_csv {
        Some(path) => Box::new(MemoryProvider::from_csv_path(path)?),
        None => {
            let breaker = Arc::new(CircuitBreaker::from_config(&config.provider));
            Box::new(YahooProvider::new(&config.provider, &exchange, breaker)?)
        }
    };

    Ok(WorkerContext {
        provider,
        names: NameDirectory::init(&config.names),
        refresher: Refresher::new(&exchange, &config.trend),
        gate: SessionGate::for_exchange(&exchange),
        clock,
    })
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_response(resp);
        }

        // 50ms poll, ~20 FPS
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}
