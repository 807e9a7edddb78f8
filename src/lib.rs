//! swing-watch: a 4H technical-checklist watcher for Bitget markets.
//!
//! The pipeline is candles -> indicators -> checklist -> plan. Two polling
//! loops drive it (a slow setup scan and a fast take-profit watch) and a
//! console command surface reads the same shared state.

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod report;
pub mod utils;

use clap::Parser;

use crate::config::BITGET;

#[derive(Parser, Debug)]
#[command(name = "swing-watch", version, about = "4H checklist watcher with trade plans and TP alerts")]
pub struct Cli {
    /// Symbols to watch (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "BTCUSDT,ETHUSDT")]
    pub symbols: Vec<String>,

    /// Seconds between checklist scans
    #[arg(long, default_value_t = BITGET.watch.setup_poll_sec)]
    pub poll_interval_sec: u64,

    /// Seconds between take-profit price polls
    #[arg(long, default_value_t = BITGET.watch.tp_poll_sec)]
    pub tp_poll_interval_sec: u64,

    /// Run one scan, print the setup status and exit
    #[arg(long)]
    pub once: bool,

    /// Include per-check reason lines in alerts
    #[arg(long)]
    pub reasons: bool,
}

impl Cli {
    /// Upcased, de-duplicated symbol list in the order given.
    pub fn normalized_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for symbol in &self.symbols {
            let symbol = symbol.trim().to_ascii_uppercase();
            if !symbol.is_empty() && !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_upcased_and_deduplicated() {
        let cli = Cli::parse_from(["swing-watch", "--symbols", "btcusdt, ethusdt,BTCUSDT"]);
        assert_eq!(cli.normalized_symbols(), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn poll_intervals_default_from_config() {
        let cli = Cli::parse_from(["swing-watch"]);
        assert_eq!(cli.poll_interval_sec, BITGET.watch.setup_poll_sec);
        assert_eq!(cli.tp_poll_interval_sec, BITGET.watch.tp_poll_sec);
        assert!(!cli.once);
    }
}
