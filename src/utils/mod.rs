// Small shared helpers (no domain logic here)
pub mod maths_utils;
pub mod time_utils;

// Re-export commonly used items
pub use time_utils::TimeUtils;
