//! Slash-command handling for the interactive console.
//!
//! Status commands answer from the shared book without touching the
//! network; analysis commands (`/checklist`, `/plan`, `/levels`) fetch fresh
//! candles so the reply reflects the market now, not the last poll.

use std::str::FromStr;

use chrono::Utc;

use crate::analysis::{self, clusters, evaluate};
use crate::config::{ANALYSIS, BITGET};
use crate::domain::{Bias, Candle};
use crate::engine::watcher::EngineCtx;
use crate::report;

const HELP: &str = "Commands:\n\
/checklist [SYMBOL] - run the 4H checklist now\n\
/plan [SYMBOL] [LONG|SHORT] - build a trade plan (bias defaults to the verdict)\n\
/levels [SYMBOL] - nearest confirmed pivot levels\n\
/setup_status - last verdict per symbol\n\
/tp_status - armed plans and fired take-profits\n\
/cluster add PRICE SIZE_USD - pin a liquidity cluster (expires after 24h)\n\
/cluster list [SYMBOL] - clusters near the current price\n\
/status - watcher health\n\
/help - this text";

/// Execute one console line and produce the reply text.
pub async fn handle_command(ctx: &EngineCtx, line: &str) -> String {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return HELP.to_string();
    };
    let args: Vec<&str> = parts.collect();

    match command.to_ascii_lowercase().as_str() {
        "/help" => HELP.to_string(),
        "/status" => report::status_block(&*ctx.book.lock().await),
        "/setup_status" => report::setup_status_block(&*ctx.book.lock().await),
        "/tp_status" => report::tp_status_block(&*ctx.book.lock().await),
        "/checklist" => cmd_checklist(ctx, &args).await,
        "/plan" => cmd_plan(ctx, &args).await,
        "/levels" => cmd_levels(ctx, &args).await,
        "/cluster" => cmd_cluster(ctx, &args).await,
        _ => format!("Unknown command: {command}\n\n{HELP}"),
    }
}

/// Pick the symbol out of free-form args; anything that parses as a bias is
/// not a symbol. Falls back to the first configured symbol.
fn resolve_symbol<'a>(ctx: &'a EngineCtx, args: &[&'a str]) -> String {
    args.iter()
        .find(|a| Bias::from_str(&a.to_ascii_uppercase()).is_err())
        .map(|a| a.to_ascii_uppercase())
        .unwrap_or_else(|| ctx.symbols[0].clone())
}

fn resolve_bias(args: &[&str]) -> Option<Bias> {
    args.iter()
        .find_map(|a| Bias::from_str(&a.to_ascii_uppercase()).ok())
}

async fn fetch(ctx: &EngineCtx, symbol: &str) -> Result<Vec<Candle>, String> {
    ctx.candles
        .fetch_candles(symbol, BITGET.client.granularity, BITGET.client.candle_limit)
        .await
        .map_err(|e| format!("⚠️ [{symbol}] candle fetch failed: {e:#}"))
}

async fn cmd_checklist(ctx: &EngineCtx, args: &[&str]) -> String {
    let symbol = resolve_symbol(ctx, args);
    match fetch(ctx, &symbol).await {
        Ok(candles) => {
            let verdict = evaluate(&candles, &ANALYSIS);
            report::checklist_block(&symbol, &verdict, true)
        }
        Err(e) => e,
    }
}

async fn cmd_plan(ctx: &EngineCtx, args: &[&str]) -> String {
    let symbol = resolve_symbol(ctx, args);
    let candles = match fetch(ctx, &symbol).await {
        Ok(candles) => candles,
        Err(e) => return e,
    };

    let bias = match resolve_bias(args) {
        Some(bias) => bias,
        None => evaluate(&candles, &ANALYSIS).bias,
    };
    let Some(plan) = analysis::build_plan(&candles, bias, &ANALYSIS) else {
        return format!("⚠️ [{symbol}] not enough candles for a plan");
    };

    let snapshot = {
        let mut cluster_book = ctx.clusters.lock().await;
        cluster_book.prune(Utc::now().timestamp(), &ANALYSIS);
        cluster_book.snapshot(plan.last_close, &ANALYSIS)
    };
    report::plan_block(&symbol, &plan, &snapshot)
}

async fn cmd_levels(ctx: &EngineCtx, args: &[&str]) -> String {
    let symbol = resolve_symbol(ctx, args);
    match fetch(ctx, &symbol).await {
        Ok(candles) if !candles.is_empty() => {
            let levels = analysis::nearest_levels(&candles, 3, &ANALYSIS);
            report::levels_block(&symbol, &levels)
        }
        Ok(_) => format!("⚠️ [{symbol}] no candles returned"),
        Err(e) => e,
    }
}

async fn cmd_cluster(ctx: &EngineCtx, args: &[&str]) -> String {
    match args.first().copied() {
        Some("add") => {
            let (Some(price), Some(size_usd)) = (
                args.get(1).and_then(|a| a.parse::<f64>().ok()),
                args.get(2).and_then(|a| a.parse::<f64>().ok()),
            ) else {
                return "Usage: /cluster add PRICE SIZE_USD".to_string();
            };
            let now_s = Utc::now().timestamp();
            let mut cluster_book = ctx.clusters.lock().await;
            cluster_book.prune(now_s, &ANALYSIS);
            cluster_book.add_manual(price, size_usd, now_s);
            format!(
                "Pinned cluster at {} ({:.0}M USD), {} manual total",
                report::fmt_price(price),
                size_usd / 1e6,
                cluster_book.manual_count()
            )
        }
        Some("list") => {
            let symbol = resolve_symbol(ctx, &args[1..]);
            let spot = match ctx.prices.last_price(&symbol).await {
                Ok(Some(spot)) => spot,
                Ok(None) => return format!("⚠️ [{symbol}] no price available"),
                Err(e) => return format!("⚠️ [{symbol}] price fetch failed: {e:#}"),
            };
            let snapshot = {
                let mut cluster_book = ctx.clusters.lock().await;
                cluster_book.prune(Utc::now().timestamp(), &ANALYSIS);
                cluster_book.snapshot(spot, &ANALYSIS)
            };
            let near = clusters::clusters_near(spot, &snapshot, &ANALYSIS);
            if near.is_empty() {
                return format!("💧 [Clusters] {symbol}: none within range of {}", report::fmt_price(spot));
            }
            let body: Vec<String> = near
                .iter()
                .map(|c| format!("{} ({:.0}M USD)", report::fmt_price(c.price), c.size_usd / 1e6))
                .collect();
            format!("💧 [Clusters] {symbol} near {}:\n{}", report::fmt_price(spot), body.join("\n"))
        }
        _ => "Usage: /cluster add PRICE SIZE_USD | /cluster list [SYMBOL]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    use crate::analysis::ClusterBook;
    use crate::data::{CandleSource, PriceSource};
    use crate::engine::messages::AlertSink;
    use crate::engine::state::AlertBook;

    struct StaticCandles(Vec<Candle>);

    #[async_trait]
    impl CandleSource for StaticCandles {
        async fn fetch_candles(&self, _: &str, _: &str, _: u32) -> Result<Vec<Candle>> {
            Ok(self.0.clone())
        }
    }

    struct StaticPrice(f64);

    #[async_trait]
    impl PriceSource for StaticPrice {
        async fn last_price(&self, _: &str) -> Result<Option<f64>> {
            Ok(Some(self.0))
        }
    }

    struct NullSink;

    #[async_trait]
    impl AlertSink for NullSink {
        async fn send(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n as i64)
            .map(|i| Candle::new(i * 14_400, 100.5, 101.0, 100.0, 100.5, 1.0))
            .collect()
    }

    fn ctx() -> EngineCtx {
        let symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        EngineCtx {
            candles: Arc::new(StaticCandles(flat_candles(250))),
            prices: Arc::new(StaticPrice(100.5)),
            sink: Arc::new(NullSink),
            book: Arc::new(Mutex::new(AlertBook::new(&symbols))),
            clusters: Arc::new(Mutex::new(ClusterBook::new())),
            symbols,
            include_reasons: false,
        }
    }

    #[tokio::test]
    async fn unknown_commands_reply_with_help() {
        let ctx = ctx();
        let reply = handle_command(&ctx, "/frobnicate").await;
        assert!(reply.contains("Unknown command"));
        assert!(reply.contains("/checklist"));
        assert_eq!(handle_command(&ctx, "/help").await, HELP);
    }

    #[tokio::test]
    async fn checklist_defaults_to_the_first_symbol() {
        let ctx = ctx();
        let reply = handle_command(&ctx, "/checklist").await;
        assert!(reply.contains("[AI Checklist] BTCUSDT"));
        let reply = handle_command(&ctx, "/checklist ethusdt").await;
        assert!(reply.contains("[AI Checklist] ETHUSDT"), "symbols are upcased");
    }

    #[tokio::test]
    async fn plan_accepts_a_bias_override_in_any_arg_position() {
        let ctx = ctx();
        let reply = handle_command(&ctx, "/plan short ETHUSDT").await;
        assert!(reply.contains("[Trade Plan] ETHUSDT SHORT"));
        // Without an override a flat tape has no directional verdict:
        // the NEUTRAL fallback plan is still produced
        let reply = handle_command(&ctx, "/plan").await;
        assert!(reply.contains("[Trade Plan] BTCUSDT NEUTRAL"));
    }

    #[tokio::test]
    async fn cluster_add_then_list_round_trips() {
        let ctx = ctx();
        let reply = handle_command(&ctx, "/cluster add 100.6 200000000").await;
        assert!(reply.contains("1 manual total"));
        let reply = handle_command(&ctx, "/cluster list").await;
        assert!(reply.contains("100.60 (200M USD)"));
        assert_eq!(
            handle_command(&ctx, "/cluster").await,
            "Usage: /cluster add PRICE SIZE_USD | /cluster list [SYMBOL]"
        );
    }

    #[tokio::test]
    async fn levels_handles_a_flat_tape() {
        let ctx = ctx();
        let reply = handle_command(&ctx, "/levels").await;
        assert!(reply.contains("[Levels] BTCUSDT"));
        // Flat bars have no strict pivots on either side
        assert!(reply.contains("Resistance: -"));
        assert!(reply.contains("Support: -"));
    }
}
