//! Human-facing text blocks for alerts and command replies.
//!
//! All formatting lives here so the watcher loops and the command handler
//! emit identical text for the same state.

use itertools::Itertools;

use crate::analysis::{CheckResult, ChecklistVerdict, Cluster, Levels, Plan};
use crate::config::{ANALYSIS, BITGET};
use crate::engine::state::{AlertBook, SymbolState};
use crate::utils::time_utils;

const MAX_REASONS_PER_SECTION: usize = 5;

/// Compact price text: coarse ticks for large prices, four decimals for
/// sub-hundred ones.
pub fn fmt_price(p: f64) -> String {
    if p.abs() >= 100.0 {
        format!("{p:.2}")
    } else {
        format!("{p:.4}")
    }
}

fn check_section(name: &str, check: &CheckResult, include_reasons: bool) -> String {
    let mark = if check.passed { "✅" } else { "❌" };
    let mut out = format!("{name} ({}/{}) {mark}", check.score, check.max_score);
    if include_reasons {
        for reason in check.reasons.iter().take(MAX_REASONS_PER_SECTION) {
            out.push_str("\n• ");
            out.push_str(reason);
        }
    }
    out
}

/// The full checklist message, as sent on verdict transitions and replied
/// to `/checklist`.
pub fn checklist_block(symbol: &str, verdict: &ChecklistVerdict, include_reasons: bool) -> String {
    let header = format!(
        "🧠 [AI Checklist] {symbol} {}\nVerdict: {} | Bias: {} | Score: {}/{}",
        BITGET.client.granularity, verdict.status, verdict.bias, verdict.score, verdict.max_score
    );
    [
        header,
        check_section("Structure", &verdict.structure, include_reasons),
        check_section("Liquidity", &verdict.liquidity, include_reasons),
        check_section("FVG", &verdict.fvg, include_reasons),
    ]
    .iter()
    .join("\n\n")
}

/// Trade-plan message. Take-profit levels sitting on a liquidity cluster
/// are tagged.
pub fn plan_block(symbol: &str, plan: &Plan, clusters: &[Cluster]) -> String {
    let tps = plan
        .tps
        .iter()
        .enumerate()
        .map(|(i, &tp)| {
            let tag = if crate::analysis::clusters::is_confluent(tp, clusters, &ANALYSIS) {
                " ✚liq"
            } else {
                ""
            };
            format!("TP{}: {}{tag}", i + 1, fmt_price(tp))
        })
        .join(" | ");

    format!(
        "📋 [Trade Plan] {symbol} {}\nEntry: {} - {}\nStop: {}\n{tps}\nRange: S {} / R {} (last {})",
        plan.bias,
        fmt_price(plan.entry_low),
        fmt_price(plan.entry_high),
        fmt_price(plan.stop),
        fmt_price(plan.support),
        fmt_price(plan.resistance),
        fmt_price(plan.last_close),
    )
}

/// Reply to `/levels`: nearest confirmed pivots on each side of the close.
pub fn levels_block(symbol: &str, levels: &Levels) -> String {
    let fmt_side = |side: &[f64]| {
        if side.is_empty() {
            "-".to_string()
        } else {
            side.iter().map(|&p| fmt_price(p)).join(", ")
        }
    };
    format!(
        "📐 [Levels] {symbol} (last {})\nResistance: {}\nSupport: {}",
        fmt_price(levels.last_close),
        fmt_side(&levels.resistances),
        fmt_side(&levels.supports),
    )
}

/// One-line take-profit hit alert.
pub fn tp_hit_line(symbol: &str, plan: &Plan, tp_index: usize, price: f64) -> String {
    format!(
        "🎯 [TP{} HIT] {symbol} {} at {} (target {})",
        tp_index + 1,
        plan.bias,
        fmt_price(price),
        fmt_price(plan.tps[tp_index]),
    )
}

fn tp_progress_line(state: &SymbolState) -> String {
    match &state.progress {
        Some(progress) => {
            let marks = progress
                .tp_hit
                .iter()
                .enumerate()
                .map(|(i, &hit)| {
                    let mark = if hit { "✅" } else { "…" };
                    format!("TP{} {} {mark}", i + 1, fmt_price(progress.plan.tps[i]))
                })
                .join(" | ");
            format!("{} {marks}", progress.plan.bias)
        }
        None => "no armed plan".to_string(),
    }
}

/// Reply to `/tp_status`: armed-plan progress per symbol.
pub fn tp_status_block(book: &AlertBook) -> String {
    let body = book
        .symbols_sorted()
        .iter()
        .filter_map(|symbol| {
            book.state(symbol)
                .map(|state| format!("{symbol}: {}", tp_progress_line(state)))
        })
        .join("\n");
    format!("🎯 [TP Status]\n{body}")
}

fn verdict_summary(state: &SymbolState) -> String {
    match &state.last_verdict {
        Some(v) => format!("{} | {} | {}/{}", v.status, v.bias, v.score, v.max_score),
        None => "not evaluated yet".to_string(),
    }
}

/// Reply to `/setup_status`: last verdict per symbol.
pub fn setup_status_block(book: &AlertBook) -> String {
    let body = book
        .symbols_sorted()
        .iter()
        .filter_map(|symbol| {
            book.state(symbol)
                .map(|state| format!("{symbol}: {}", verdict_summary(state)))
        })
        .join("\n");
    format!("🧠 [Setup Status]\n{body}")
}

/// Reply to `/status`: watcher health per symbol.
pub fn status_block(book: &AlertBook) -> String {
    let body = book
        .symbols_sorted()
        .iter()
        .filter_map(|symbol| {
            book.state(symbol).map(|state| {
                let checked = time_utils::epoch_or_dash(state.last_checked_s);
                let health = match &state.last_error {
                    Some(err) => format!("⚠️ {err}"),
                    None => "ok".to_string(),
                };
                format!(
                    "{symbol}: checked {checked} | alerts {} | {health}",
                    state.alerts_sent
                )
            })
        })
        .join("\n");
    format!("🔧 [Watcher Status]\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::evaluate;
    use crate::domain::Bias;

    fn sample_plan() -> Plan {
        Plan {
            bias: Bias::Long,
            entry_low: 100.07,
            entry_high: 100.42,
            stop: 99.58,
            tps: [100.675, 100.85, 101.0],
            support: 100.0,
            resistance: 101.0,
            last_close: 100.5,
        }
    }

    #[test]
    fn checklist_block_carries_verdict_and_sections() {
        let verdict = evaluate(&[], &ANALYSIS);
        let text = checklist_block("BTCUSDT", &verdict, true);
        assert!(text.contains("🧠 [AI Checklist] BTCUSDT 4H"));
        assert!(text.contains("🔴 NO DATA"));
        assert!(text.contains("Structure (0/4) ❌"));
        assert!(text.contains("• No candles returned from feed."));

        let terse = checklist_block("BTCUSDT", &verdict, false);
        assert!(!terse.contains('•'), "reasons are opt-in");
    }

    #[test]
    fn plan_block_tags_confluent_targets() {
        // 101.6 is within 0.6% of TP3 only
        let clusters = [Cluster { price: 101.6, size_usd: 2.0e8 }];
        let text = plan_block("BTCUSDT", &sample_plan(), &clusters);
        assert!(text.contains("Entry: 100.07 - 100.42"));
        assert!(text.contains("TP3: 101.00 ✚liq"));
        assert!(!text.contains("TP1: 100.67 ✚liq"));
        assert!(!text.contains("TP2: 100.85 ✚liq"));
    }

    #[test]
    fn tp_hit_line_names_level_and_price() {
        let line = tp_hit_line("ETHUSDT", &sample_plan(), 1, 100.9);
        assert!(line.contains("TP2"));
        assert!(line.contains("100.90"));
        assert!(line.contains("100.85"));
    }

    #[test]
    fn status_blocks_cover_every_symbol_in_sorted_order() {
        let book = AlertBook::new(&["ETHUSDT".to_string(), "BTCUSDT".to_string()]);
        let text = setup_status_block(&book);
        let btc = text.find("BTCUSDT").unwrap();
        let eth = text.find("ETHUSDT").unwrap();
        assert!(btc < eth);
        assert!(text.contains("not evaluated yet"));
        assert!(tp_status_block(&book).contains("no armed plan"));
        assert!(status_block(&book).contains("checked -"));
    }
}
