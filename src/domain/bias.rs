use serde::{Deserialize, Serialize};

/// Directional lean reported by each checklist check and by the final verdict.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
    strum_macros::Display, strum_macros::EnumString,
)]
pub enum Bias {
    #[strum(serialize = "LONG")]
    Long,
    #[strum(serialize = "SHORT")]
    Short,
    #[default]
    #[strum(serialize = "NEUTRAL")]
    Neutral,
}

impl Bias {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Bias::Neutral)
    }
}

/// Final gate for an automated setup alert.
/// `NoData` is reserved for the empty-candle case and short-circuits scoring.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, strum_macros::Display,
)]
pub enum VerdictStatus {
    #[strum(serialize = "✅ SETUP VALID")]
    SetupValid,
    #[strum(serialize = "🟡 PARTIAL (WAIT)")]
    PartialWait,
    #[strum(serialize = "🔴 NO TRADE")]
    NoTrade,
    #[strum(serialize = "🔴 NO DATA")]
    NoData,
}
