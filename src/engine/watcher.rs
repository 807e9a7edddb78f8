//! The two polling loops: a slow setup scan over fresh candles and a fast
//! take-profit watcher over live prints.
//!
//! Lock discipline: alert text is composed while the book is locked, but the
//! sink is only called after the lock is dropped. A slow delivery must never
//! stall the other watcher or the command handler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;

use crate::analysis::{self, ClusterBook, evaluate};
use crate::config::{ANALYSIS, BITGET};
use crate::data::{CandleSource, PriceSource};
use crate::domain::VerdictStatus;
use crate::engine::messages::AlertSink;
use crate::engine::state::AlertBook;
use crate::report;

/// Everything a watcher loop needs. Cheap to clone; all heavy state is
/// behind an `Arc`.
#[derive(Clone)]
pub struct EngineCtx {
    pub candles: Arc<dyn CandleSource>,
    pub prices: Arc<dyn PriceSource>,
    pub sink: Arc<dyn AlertSink>,
    pub book: Arc<Mutex<AlertBook>>,
    pub clusters: Arc<Mutex<ClusterBook>>,
    pub symbols: Vec<String>,
    pub include_reasons: bool,
}

/// One full checklist pass over every symbol, concurrently.
pub async fn scan_once(ctx: &EngineCtx) {
    let scans = ctx.symbols.iter().map(|symbol| scan_symbol(ctx, symbol));
    join_all(scans).await;
}

async fn scan_symbol(ctx: &EngineCtx, symbol: &str) {
    let now_s = Utc::now().timestamp();
    let candles = match ctx
        .candles
        .fetch_candles(symbol, BITGET.client.granularity, BITGET.client.candle_limit)
        .await
    {
        Ok(candles) => candles,
        Err(e) => {
            // Fetch failure is "no data this cycle": the NO DATA verdict goes
            // through the same transition dedup as any other status.
            log::warn!("[{symbol}] candle fetch failed: {e:#}");
            let verdict = evaluate(&[], &ANALYSIS);
            let changed = {
                let mut book = ctx.book.lock().await;
                let changed = book.record_verdict(symbol, verdict.clone(), now_s);
                book.record_error(symbol, &format!("{e:#}"), now_s);
                changed
            };
            if changed {
                let text = report::checklist_block(symbol, &verdict, ctx.include_reasons);
                if let Err(e) = ctx.sink.send(&text).await {
                    log::error!("[{symbol}] alert delivery failed: {e:#}");
                }
            }
            return;
        }
    };

    let verdict = evaluate(&candles, &ANALYSIS);
    log::info!(
        "[{symbol}] verdict {} bias {} score {}/{}",
        verdict.status,
        verdict.bias,
        verdict.score,
        verdict.max_score
    );

    let plan = if verdict.status == VerdictStatus::SetupValid {
        analysis::build_plan(&candles, verdict.bias, &ANALYSIS)
    } else {
        None
    };

    let clusters = match (plan.as_ref(), candles.last()) {
        (Some(_), Some(last)) => {
            let mut cluster_book = ctx.clusters.lock().await;
            cluster_book.prune(now_s, &ANALYSIS);
            cluster_book.snapshot(last.close_price, &ANALYSIS)
        }
        _ => Vec::new(),
    };

    let mut alerts: Vec<String> = Vec::new();
    {
        let mut book = ctx.book.lock().await;
        let changed = book.record_verdict(symbol, verdict.clone(), now_s);
        if let Some(plan) = plan {
            book.arm_plan(symbol, plan);
            if changed {
                alerts.push(report::plan_block(symbol, &plan, &clusters));
            }
        }
        if changed {
            alerts.insert(0, report::checklist_block(symbol, &verdict, ctx.include_reasons));
        }
    }

    for text in alerts {
        if let Err(e) = ctx.sink.send(&text).await {
            log::error!("[{symbol}] alert delivery failed: {e:#}");
        }
    }
}

/// One price pass over every symbol. Prints that fail the sanity filter are
/// dropped for this poll.
pub async fn poll_tp_hits(ctx: &EngineCtx) {
    for symbol in &ctx.symbols {
        let price = match ctx.prices.last_price(symbol).await {
            Ok(Some(price)) => price,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("[{symbol}] price fetch failed: {e:#}");
                continue;
            }
        };

        let hit = {
            let mut book = ctx.book.lock().await;
            if !book.accept_price(symbol, price, BITGET.watch.price_sanity_pct) {
                log::warn!("[{symbol}] price {price} outside sanity band, skipping");
                continue;
            }
            book.on_price(symbol, price)
        };

        if let Some((plan, tp_index)) = hit {
            let line = report::tp_hit_line(symbol, &plan, tp_index, price);
            log::info!("{line}");
            if let Err(e) = ctx.sink.send(&line).await {
                log::error!("[{symbol}] alert delivery failed: {e:#}");
            }
        }
    }
}

/// Slow loop: checklist scan every `poll_sec`.
pub async fn run_setup_watcher(ctx: EngineCtx, poll_sec: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(poll_sec));
    loop {
        ticker.tick().await;
        scan_once(&ctx).await;
    }
}

/// Fast loop: take-profit watch every `poll_sec`.
pub async fn run_tp_watcher(ctx: EngineCtx, poll_sec: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(poll_sec));
    loop {
        ticker.tick().await;
        poll_tp_hits(&ctx).await;
    }
}
