// Domain types and value objects
pub mod bias;
pub mod candle;

// Re-export commonly used types
pub use bias::{Bias, VerdictStatus};
pub use candle::{Candle, CandleType};
