//! Bitget public REST feed (candles + last price).
//!
//! No authentication: the checklist only consumes public market data.
//! MIX (futures) endpoints are tried first with a SPOT fallback, because the
//! same symbol often exists in both universes and either shape normalizes
//! through `ingest::normalize`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::BITGET;
use crate::data::{CandleSource, PriceSource, ingest};
use crate::domain::Candle;

pub struct BitgetFeed {
    client: reqwest::Client,
    base_url: String,
}

impl BitgetFeed {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BITGET.rest.base_url)
    }

    /// Point the feed at a different host (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(BITGET.client.timeout_ms))
            .build()
            .context("building Bitget HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Bitget HTTP {status} for {path}");
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("decoding {path} body"))?;

        // Bitget wraps every response in {code, msg, data}; "00000" is success.
        if let Some(code) = body.get("code").and_then(Value::as_str)
            && code != "00000"
        {
            let msg = body.get("msg").and_then(Value::as_str).unwrap_or("?");
            bail!("Bitget API error {code}: {msg}");
        }

        Ok(body)
    }
}

#[async_trait]
impl CandleSource for BitgetFeed {
    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let limit_s = limit.to_string();
        let query = [
            ("symbol", symbol),
            ("granularity", granularity),
            ("limit", limit_s.as_str()),
        ];

        match self.get_json(BITGET.rest.mix_candles_path, &query).await {
            Ok(body) => {
                let candles = ingest::normalize(&body);
                if !candles.is_empty() {
                    return Ok(candles);
                }
                log::info!("[{symbol}] mix candles empty, falling back to spot");
            }
            Err(e) => log::warn!("[{symbol}] mix candles failed, trying spot: {e:#}"),
        }

        let body = self.get_json(BITGET.rest.spot_candles_path, &query).await?;
        Ok(ingest::normalize(&body))
    }
}

#[async_trait]
impl PriceSource for BitgetFeed {
    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        let mix_query = [
            ("symbol", symbol),
            ("productType", BITGET.rest.mix_product_type),
        ];
        let body = match self.get_json(BITGET.rest.mix_ticker_path, &mix_query).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("[{symbol}] mix ticker failed, trying spot: {e:#}");
                self.get_json(BITGET.rest.spot_ticker_path, &[("symbol", symbol)])
                    .await?
            }
        };
        Ok(extract_last_price(&body))
    }
}

/// Pull a last-price print out of a ticker envelope. Both universes return
/// `data` as either a single object or a one-element array.
fn extract_last_price(body: &Value) -> Option<f64> {
    let row = match body.get("data") {
        Some(Value::Array(rows)) => rows.first()?,
        Some(row @ Value::Object(_)) => row,
        _ => return None,
    };
    ["lastPr", "last", "close"]
        .iter()
        .find_map(|k| row.get(*k))
        .and_then(|v| match v {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
}
