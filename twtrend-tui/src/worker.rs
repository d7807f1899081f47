//! Background worker thread. Every provider fetch happens here.
//!
//! The main thread talks to it through two `mpsc` channels. Commands run one
//! at a time in arrival order; fetches inside a command are sequential.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::NaiveDate;
use tracing::{info, warn};

use twtrend_core::data::{DataProvider, FetchProgress, NameDirectory};
use twtrend_core::domain::SecurityCode;
use twtrend_core::lookup::{self, HistoryLookup};
use twtrend_core::market::{MarketClock, SessionGate};
use twtrend_core::trend::Horizon;
use twtrend_core::{Refresher, SessionSnapshot};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Refresh { codes: Vec<SecurityCode> },
    Lookup { codes: Vec<SecurityCode>, date: NaiveDate },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Progress {
        code: String,
        index: usize,
        total: usize,
    },
    RefreshDone(Box<SessionSnapshot>),
    LookupDone(Box<HistoryLookup>),
    Error { message: String, context: String },
}

/// What the worker owns: the provider and everything needed to run a
/// command against it.
pub struct WorkerContext {
    pub provider: Box<dyn DataProvider>,
    pub names: NameDirectory,
    pub refresher: Refresher,
    pub gate: SessionGate,
    pub clock: MarketClock,
}

/// Forwards per-security progress to the main thread.
struct ChannelProgress<'a> {
    tx: &'a Sender<WorkerResponse>,
}

impl FetchProgress for ChannelProgress<'_> {
    fn on_start(&self, code: &SecurityCode, index: usize, total: usize) {
        let _ = self.tx.send(WorkerResponse::Progress {
            code: code.to_string(),
            index,
            total,
        });
    }

    fn on_complete(&self, _: &SecurityCode, _: usize, _: usize, _: &Result<(), String>) {}

    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    ctx: WorkerContext,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("twtrend-worker".into())
        .spawn(move || worker_loop(&ctx, rx, tx))
}

fn worker_loop(ctx: &WorkerContext, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                let resp = handle_command(ctx, cmd, &tx);
                if tx.send(resp).is_err() {
                    break;
                }
            }
        }
    }
    info!("worker stopped");
}

fn handle_command(
    ctx: &WorkerContext,
    cmd: WorkerCommand,
    tx: &Sender<WorkerResponse>,
) -> WorkerResponse {
    if !ctx.provider.is_available() {
        warn!(provider = ctx.provider.name(), "provider unavailable");
        return WorkerResponse::Error {
            message: format!("{} 暫時無法連線，請稍後再試", ctx.provider.name()),
            context: "circuit breaker open".into(),
        };
    }

    let progress = ChannelProgress { tx };
    match cmd {
        WorkerCommand::Refresh { codes } => {
            let snapshot = ctx.refresher.refresh(
                ctx.provider.as_ref(),
                &ctx.names,
                &codes,
                &ctx.clock.now(),
                &Horizon::ALL,
                &progress,
            );
            WorkerResponse::RefreshDone(Box::new(snapshot))
        }
        WorkerCommand::Lookup { codes, date } => {
            let result = lookup::lookup(
                ctx.provider.as_ref(),
                &ctx.names,
                &ctx.gate,
                &codes,
                date,
                &ctx.clock.now(),
                &progress,
            );
            WorkerResponse::LookupDone(Box::new(result))
        }
        // Intercepted by the loop.
        WorkerCommand::Shutdown => WorkerResponse::Error {
            message: "unexpected shutdown command".into(),
            context: String::new(),
        },
    }
}
