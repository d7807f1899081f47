//! twtrend CLI: quotes, trend tables, date lookup and name resolution.
//!
//! Commands:
//! - `quote`: latest close, change and volume per code; optional CSV export
//! - `trend`: weekly / monthly / year-to-date percentage-return tables
//! - `lookup`: OHLCV for one date, hidden until that session has closed
//! - `names`: resolved display names and the secondary table status
//!
//! Per-security failures are printed as warnings; they never change the exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use twtrend_core::config::AppConfig;
use twtrend_core::data::{
    CircuitBreaker, DataProvider, MemoryProvider, NameDirectory, Period, StderrProgress,
    YahooProvider,
};
use twtrend_core::domain::{parse_code_list, SecurityCode};
use twtrend_core::export;
use twtrend_core::logging::{init_logging, LoggingConfig};
use twtrend_core::lookup::{lookup, HistoryLookup};
use twtrend_core::market::{GateVerdict, MarketClock, SessionGate};
use twtrend_core::quote::{fetch_quotes, QuoteRow};
use twtrend_core::trend::{AlignedTable, Horizon};
use twtrend_core::{Exchange, Refresher};

#[derive(Parser)]
#[command(
    name = "twtrend",
    about = "twtrend: Taiwan stock closes and weekly/monthly/yearly trend comparison"
)]
struct Cli {
    /// TOML config file. Every setting has a default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve bars from a CSV file (code,date,open,high,low,close,volume) instead of the network.
    #[arg(long, global = true)]
    bars_csv: Option<PathBuf>,

    /// Pin "now" to an exchange-local time, e.g. 2024-12-09T14:00.
    #[arg(long, global = true)]
    as_of: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest close, change and volume per code.
    Quote {
        /// Codes, comma or space separated. Defaults to the configured list.
        codes: Vec<String>,

        /// Write the table as CSV (UTF-8 with BOM). Defaults to ./stock_YYYYMMDD.csv.
        #[arg(long, num_args = 0..=1)]
        export: Option<Option<PathBuf>>,
    },
    /// Percentage-return tables relative to each security's own baseline.
    Trend {
        /// Codes, comma or space separated. Defaults to the configured list.
        codes: Vec<String>,

        #[arg(long, value_enum, default_value_t = HorizonArg::All)]
        horizon: HorizonArg,

        /// Print the session snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// OHLCV for one date.
    Lookup {
        /// Codes, comma or space separated. Defaults to the configured list.
        codes: Vec<String>,

        /// Date to look up (YYYY-MM-DD).
        #[arg(long)]
        date: String,
    },
    /// Resolve display names.
    Names {
        /// Codes, comma or space separated. Defaults to the configured list.
        codes: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HorizonArg {
    Weekly,
    Monthly,
    Yearly,
    All,
}

impl HorizonArg {
    fn horizons(self) -> Vec<Horizon> {
        match self {
            HorizonArg::Weekly => vec![Horizon::Weekly],
            HorizonArg::Monthly => vec![Horizon::Monthly],
            HorizonArg::Yearly => vec![Horizon::Yearly],
            HorizonArg::All => Horizon::ALL.to_vec(),
        }
    }
}

/// Everything a command needs, built once from the global flags.
struct Session {
    config: AppConfig,
    exchange: Exchange,
    clock: MarketClock,
    provider: Box<dyn DataProvider>,
    names: NameDirectory,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let exchange = config.exchange.resolve()?;

        let clock = match cli.as_of.as_deref() {
            Some(raw) => {
                let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                    .with_context(|| format!("invalid --as-of '{raw}' (expected YYYY-MM-DDTHH:MM)"))?;
                MarketClock::fixed_local(exchange.clone(), local)
                    .with_context(|| format!("--as-of '{raw}' does not exist in {}", exchange.tz))?
            }
            None => MarketClock::new(exchange.clone()),
        };

        let provider: Box<dyn DataProvider> = match &cli.bars_csv {
            Some(path) => Box::new(MemoryProvider::from_csv_path(path)?),
            None => {
                let breaker = Arc::new(CircuitBreaker::from_config(&config.provider));
                Box::new(YahooProvider::new(&config.provider, &exchange, breaker)?)
            }
        };

        let names = NameDirectory::init(&config.names);
        tracing::debug!(provider = provider.name(), names = %names.secondary.describe(), "session ready");

        Ok(Self {
            config,
            exchange,
            clock,
            provider,
            names,
        })
    }

    /// Codes from the command line, or the configured defaults.
    fn codes(&self, args: &[String]) -> Result<Vec<SecurityCode>> {
        let codes = if args.is_empty() {
            parse_code_list(&self.config.session.default_codes.join(","))
        } else {
            parse_code_list(&args.join(","))
        };
        if codes.is_empty() {
            bail!("no security codes given");
        }
        Ok(codes)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_env())?;
    let session = Session::open(&cli)?;

    match &cli.command {
        Commands::Quote { codes, export } => run_quote(&session, codes, export.as_ref()),
        Commands::Trend {
            codes,
            horizon,
            json,
        } => run_trend(&session, codes, *horizon, *json),
        Commands::Lookup { codes, date } => run_lookup(&session, codes, date),
        Commands::Names { codes } => run_names(&session, codes),
    }
}

fn run_quote(
    session: &Session,
    codes: &[String],
    export_to: Option<&Option<PathBuf>>,
) -> Result<()> {
    let codes = session.codes(codes)?;
    let period = Period::TradingDays(session.config.trend.quote_period_days);
    let batch = fetch_quotes(
        session.provider.as_ref(),
        &session.names,
        &codes,
        period,
        &StderrProgress,
    );

    print_quotes(&batch.rows);
    print_warnings(&batch.warnings);

    if let Some(target) = export_to {
        if batch.rows.is_empty() {
            println!("Nothing to export.");
        } else {
            let path = export::export_quotes(
                &batch.rows,
                Path::new("."),
                target.as_deref(),
                session.clock.today(),
            )?;
            println!("Exported: {}", path.display());
        }
    }
    Ok(())
}

fn run_trend(session: &Session, codes: &[String], horizon: HorizonArg, json: bool) -> Result<()> {
    let codes = session.codes(codes)?;
    let refresher = Refresher::new(&session.exchange, &session.config.trend);
    let snapshot = refresher.refresh(
        session.provider.as_ref(),
        &session.names,
        &codes,
        &session.clock.now(),
        &horizon.horizons(),
        &StderrProgress,
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?
        );
        return Ok(());
    }

    println!("資料更新時間: {}", snapshot.updated_label());
    for table in snapshot.trends.values() {
        println!();
        print_table(table);
    }
    print_warnings(&snapshot.warnings);
    Ok(())
}

fn run_lookup(session: &Session, codes: &[String], date: &str) -> Result<()> {
    let codes = session.codes(codes)?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date '{date}' (expected YYYY-MM-DD)"))?;

    let result = lookup(
        session.provider.as_ref(),
        &session.names,
        &SessionGate::for_exchange(&session.exchange),
        &codes,
        date,
        &session.clock.now(),
        &StderrProgress,
    );
    print_history(&result);
    Ok(())
}

fn run_names(session: &Session, codes: &[String]) -> Result<()> {
    let codes = session.codes(codes)?;
    println!("{}", session.names.secondary.describe());
    println!();
    println!("{:<8} {:<10} {}", "代號", "來源", "名稱");
    println!("{}", "-".repeat(36));
    for code in &codes {
        let (name, source) = session.names.resolver.resolve_with_source(code);
        println!("{:<8} {:<10} {}", code, source, name);
    }
    Ok(())
}

// ─── Printing ───────────────────────────────────────────────────────

fn print_quotes(rows: &[QuoteRow]) {
    if rows.is_empty() {
        println!("No quotes.");
        return;
    }
    println!(
        "{:<8} {:<16} {:<10} {:>10} {:>8} {:>10} {:>15}",
        "代號", "名稱", "日期", "收盤價", "漲跌", "漲跌幅(%)", "成交量"
    );
    println!("{}", "-".repeat(84));
    for r in rows {
        println!(
            "{:<8} {:<16} {:<10} {:>10.2} {:>+8.2} {:>+10.2} {:>15}",
            r.code,
            r.name,
            r.date.to_string(),
            r.close,
            r.change,
            r.change_pct,
            thousands(r.volume)
        );
    }
}

fn print_table(table: &AlignedTable) {
    println!("{}", table.horizon.title());
    if table.is_empty() {
        println!("  (no data)");
        return;
    }
    let mut header = format!("{:<22}", "日期");
    for col in &table.columns {
        header.push_str(&format!(" {:>16}", col.label()));
    }
    println!("{header}");
    for row in &table.rows {
        let mut line = format!("{:<22}", row.label);
        for v in &row.values {
            match v {
                Some(x) => line.push_str(&format!(" {:>16.2}", x)),
                None => line.push_str(&format!(" {:>16}", "-")),
            }
        }
        println!("{line}");
    }
}

fn print_history(result: &HistoryLookup) {
    match result.verdict {
        GateVerdict::FutureDate => {
            println!("no data — holiday or not yet closed ({} is in the future)", result.date);
            return;
        }
        GateVerdict::SessionNotClosed => {
            println!("no data — holiday or not yet closed (session of {} has not closed)", result.date);
            return;
        }
        GateVerdict::Displayable => {}
    }

    if result.rows.is_empty() {
        println!("no data — holiday or not yet closed");
    } else {
        println!(
            "{:<8} {:<16} {:<17} {:>10} {:>10} {:>10} {:>14} {:>15}",
            "代號", "名稱", "日期", "開盤", "最高", "最低", "收盤價 (13:30)", "成交量"
        );
        println!("{}", "-".repeat(104));
        for r in &result.rows {
            println!(
                "{:<8} {:<16} {:<17} {:>10.2} {:>10.2} {:>10.2} {:>14.2} {:>15}",
                r.code,
                r.name,
                r.timestamp,
                r.open,
                r.high,
                r.low,
                r.close,
                thousands(r.volume)
            );
        }
    }

    if !result.missing.is_empty() {
        let missing: Vec<&str> = result.missing.iter().map(|c| c.as_str()).collect();
        println!("No bar on {}: {}", result.date, missing.join(", "));
    }
    print_warnings(&result.warnings);
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}

/// `25000000` -> `25,000,000`
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
