//! Shared watcher state.
//!
//! One `AlertBook` owns every per-symbol record; the setup and take-profit
//! watchers are the only writers and go through `&mut` methods under a single
//! async mutex, so there is no cross-symbol or cross-watcher aliasing of
//! alert state. Command handlers read snapshots through the same lock.

use std::collections::HashMap;

use crate::analysis::{ChecklistVerdict, Plan, plan};

/// Take-profit progress on an armed plan. Hits are monotonic and ordered:
/// a level never un-fires, and TP2 cannot fire before TP1 even when one
/// price print clears both.
#[derive(Debug, Clone, Copy)]
pub struct PlanProgress {
    pub plan: Plan,
    pub tp_hit: [bool; 3],
}

impl PlanProgress {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            tp_hit: [false; 3],
        }
    }

    /// Feed one price print. At most one new level fires per call; the next
    /// level waits for the next poll even if the price already cleared it.
    pub fn on_price(&mut self, price: f64) -> Option<usize> {
        let next = self.tp_hit.iter().position(|hit| !hit)?;
        if plan::tp_reached(self.plan.bias, price, self.plan.tps[next]) {
            self.tp_hit[next] = true;
            Some(next)
        } else {
            None
        }
    }

    pub fn all_hit(&self) -> bool {
        self.tp_hit.iter().all(|&hit| hit)
    }
}

/// Everything the watchers know about one symbol.
#[derive(Debug, Default)]
pub struct SymbolState {
    pub last_verdict: Option<ChecklistVerdict>,
    pub progress: Option<PlanProgress>,
    pub last_error: Option<String>,
    pub last_checked_s: Option<i64>,
    pub last_price: Option<f64>,
    pub alerts_sent: u32,
}

/// The alert ledger, keyed by symbol. Symbols are registered up front so a
/// typo in a command cannot grow the book.
#[derive(Debug, Default)]
pub struct AlertBook {
    symbols: HashMap<String, SymbolState>,
}

impl AlertBook {
    pub fn new(symbols: &[String]) -> Self {
        Self {
            symbols: symbols
                .iter()
                .map(|s| (s.clone(), SymbolState::default()))
                .collect(),
        }
    }

    pub fn state(&self, symbol: &str) -> Option<&SymbolState> {
        self.symbols.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Store a fresh verdict and report whether it is a transition that
    /// deserves an alert. Re-observing the same status and bias is not.
    pub fn record_verdict(&mut self, symbol: &str, verdict: ChecklistVerdict, now_s: i64) -> bool {
        let Some(state) = self.symbols.get_mut(symbol) else {
            return false;
        };
        state.last_checked_s = Some(now_s);
        state.last_error = None;

        let changed = match &state.last_verdict {
            Some(prev) => prev.status != verdict.status || prev.bias != verdict.bias,
            None => true,
        };
        state.last_verdict = Some(verdict);
        if changed {
            state.alerts_sent += 1;
        }
        changed
    }

    /// Arm (or re-arm) a plan. A same-bias re-arm keeps fired take-profit
    /// levels so a refreshed plan never re-alerts old hits; a bias flip
    /// starts over.
    pub fn arm_plan(&mut self, symbol: &str, new_plan: Plan) {
        let Some(state) = self.symbols.get_mut(symbol) else {
            return;
        };
        match &mut state.progress {
            Some(progress) if progress.plan.bias == new_plan.bias => {
                progress.plan = new_plan;
            }
            _ => state.progress = Some(PlanProgress::new(new_plan)),
        }
    }

    pub fn clear_plan(&mut self, symbol: &str) {
        if let Some(state) = self.symbols.get_mut(symbol) {
            state.progress = None;
        }
    }

    /// Glitch filter for ticker prints. A print deviating more than
    /// `max_deviation` (fractional) from the previous one is rejected, but
    /// still remembered: a genuine gap passes on the next poll instead of
    /// wedging the watcher.
    pub fn accept_price(&mut self, symbol: &str, price: f64, max_deviation: f64) -> bool {
        let Some(state) = self.symbols.get_mut(symbol) else {
            return false;
        };
        if !price.is_finite() || price <= 0.0 {
            return false;
        }
        let ok = match state.last_price {
            Some(prev) => (price - prev).abs() / prev <= max_deviation,
            None => true,
        };
        state.last_price = Some(price);
        ok
    }

    /// Route a price print to the armed plan, if any. Returns the plan and
    /// the index of the level that just fired.
    pub fn on_price(&mut self, symbol: &str, price: f64) -> Option<(Plan, usize)> {
        let state = self.symbols.get_mut(symbol)?;
        let progress = state.progress.as_mut()?;
        let hit = progress.on_price(price)?;
        Some((progress.plan, hit))
    }

    /// A failed fetch or evaluation. The previous verdict stays visible;
    /// alert dedup state is untouched, so recovery does not re-alert.
    pub fn record_error(&mut self, symbol: &str, err: &str, now_s: i64) {
        if let Some(state) = self.symbols.get_mut(symbol) {
            state.last_error = Some(err.to_string());
            state.last_checked_s = Some(now_s);
        }
    }

    /// Symbols in registration-independent sorted order for stable reports.
    pub fn symbols_sorted(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}
