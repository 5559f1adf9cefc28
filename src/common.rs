pub mod error;
pub mod money;
pub mod time_range;
