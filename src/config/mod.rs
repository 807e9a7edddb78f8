//! Configuration module for the swing-watch application.

pub mod analysis;
pub mod bitget;

// Re-export commonly used items
pub use analysis::{ANALYSIS, AnalysisConfig};
pub use bitget::BITGET;
