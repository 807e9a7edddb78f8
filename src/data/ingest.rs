//! Normalization of exchange candle payloads.
//!
//! Upstream feeds disagree on almost everything: envelope vs bare array,
//! array-rows vs object-rows, numbers vs numeric strings, seconds vs
//! milliseconds. This module folds all of that into one canonical shape:
//! a `Vec<Candle>` sorted ascending by time, with all four prices present.
//! Malformed rows are dropped silently (partial data is routine from flaky
//! upstreams, not an error) and unparsable input yields an empty Vec.

use serde_json::Value;

use crate::domain::Candle;

// Anything past this is a millisecond timestamp, not seconds.
const MS_EPOCH_CUTOFF: f64 = 1e12;

fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn normalize_time(raw: f64) -> i64 {
    if raw > MS_EPOCH_CUTOFF {
        (raw / 1000.0) as i64
    } else {
        raw as i64
    }
}

/// Fixed-order row: [time, open, high, low, close, volume, ...]
fn candle_from_array(cols: &[Value]) -> Option<Candle> {
    if cols.len() < 6 {
        return None;
    }
    let time = value_to_f64(&cols[0])?;
    let open = value_to_f64(&cols[1])?;
    let high = value_to_f64(&cols[2])?;
    let low = value_to_f64(&cols[3])?;
    let close = value_to_f64(&cols[4])?;
    let volume = value_to_f64(&cols[5]).unwrap_or(0.0);
    Some(Candle::new(
        normalize_time(time),
        open,
        high,
        low,
        close,
        volume,
    ))
}

fn field<'a>(row: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|k| row.get(*k)).and_then(value_to_f64)
}

/// Object row with flexible key names (`open`/`o`, `ts`/`candleTime`, ...).
fn candle_from_map(row: &serde_json::Map<String, Value>) -> Option<Candle> {
    let time = field(row, &["ts", "candleTime", "timestamp", "time"])?;
    let open = field(row, &["open", "o"])?;
    let high = field(row, &["high", "h"])?;
    let low = field(row, &["low", "l"])?;
    let close = field(row, &["close", "c"])?;
    let volume = field(row, &["volume", "v", "baseVol", "quoteVol"]).unwrap_or(0.0);
    Some(Candle::new(
        normalize_time(time),
        open,
        high,
        low,
        close,
        volume,
    ))
}

/// Convert a raw candle payload into canonical bars.
///
/// Duplicate timestamps are kept as-is (stable sort only); de-duplication is
/// the caller's decision.
pub fn normalize(raw: &Value) -> Vec<Candle> {
    let rows: &[Value] = match raw {
        Value::Array(rows) => rows,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut out: Vec<Candle> = rows
        .iter()
        .filter_map(|row| match row {
            Value::Array(cols) => candle_from_array(cols),
            Value::Object(map) => candle_from_map(map),
            _ => None,
        })
        .collect();

    out.sort_by_key(|c| c.time_s);
    out
}
