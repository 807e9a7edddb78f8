use chrono::{TimeZone, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const SEC_IN_MIN: i64 = 60;
    pub const SEC_IN_H: i64 = Self::SEC_IN_MIN * 60;
    pub const SEC_IN_4_H: i64 = Self::SEC_IN_H * 4;
    pub const SEC_IN_D: i64 = Self::SEC_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Convert a candle granularity in seconds to Bitget shorthand (e.g. `4H`).
    pub fn granularity_to_string(granularity_sec: i64) -> &'static str {
        match granularity_sec {
            s if s == Self::SEC_IN_MIN => "1m",
            s if s == Self::SEC_IN_MIN * 5 => "5m",
            s if s == Self::SEC_IN_MIN * 15 => "15m",
            s if s == Self::SEC_IN_MIN * 30 => "30m",
            s if s == Self::SEC_IN_H => "1H",
            s if s == Self::SEC_IN_4_H => "4H",
            s if s == Self::SEC_IN_D => "1D",
            _ => "unknown",
        }
    }
}

/// Current UTC wall-clock in the standard display format.
pub fn iso_utc_now() -> String {
    Utc::now().format(TimeUtils::STANDARD_TIME_FORMAT).to_string()
}

/// Display an optional epoch timestamp, dash when absent (status blocks).
pub fn epoch_or_dash(ts: Option<i64>) -> String {
    match ts {
        Some(t) => epoch_sec_to_utc(t),
        None => "-".to_string(),
    }
}

/// Epoch seconds to a UTC display string. Useful for candle open times.
pub fn epoch_sec_to_utc(epoch_sec: i64) -> String {
    if let chrono::LocalResult::Single(datetime) = Utc.timestamp_opt(epoch_sec, 0) {
        datetime.format(TimeUtils::STANDARD_TIME_FORMAT).to_string()
    } else {
        // Handle invalid timestamp values
        String::new()
    }
}
