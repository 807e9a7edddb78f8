use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use swing_watch::Cli;
use swing_watch::analysis::ClusterBook;
use swing_watch::data::BitgetFeed;
use swing_watch::engine::{
    self, AlertBook, EngineCtx, LogAlertSink, run_setup_watcher, run_tp_watcher, scan_once,
};
use swing_watch::report;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let symbols = cli.normalized_symbols();
    if symbols.is_empty() {
        bail!("--symbols must name at least one symbol");
    }

    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
    runtime.block_on(run(cli, symbols))
}

async fn run(cli: Cli, symbols: Vec<String>) -> Result<()> {
    let feed = Arc::new(BitgetFeed::new()?);
    let ctx = EngineCtx {
        candles: feed.clone(),
        prices: feed,
        sink: Arc::new(LogAlertSink),
        book: Arc::new(Mutex::new(AlertBook::new(&symbols))),
        clusters: Arc::new(Mutex::new(ClusterBook::new())),
        symbols: symbols.clone(),
        include_reasons: cli.reasons,
    };

    if cli.once {
        scan_once(&ctx).await;
        println!("{}", report::setup_status_block(&*ctx.book.lock().await));
        return Ok(());
    }

    log::info!(
        "watching {} every {}s (TP every {}s)",
        symbols.join(", "),
        cli.poll_interval_sec,
        cli.tp_poll_interval_sec
    );
    tokio::spawn(run_setup_watcher(ctx.clone(), cli.poll_interval_sec));
    tokio::spawn(run_tp_watcher(ctx.clone(), cli.tp_poll_interval_sec));

    // The console loop owns the foreground; EOF on stdin ends the run
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        println!("{}", engine::handle_command(&ctx, line).await);
    }
    Ok(())
}
