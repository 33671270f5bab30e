//! Core business logic abstractions

pub mod log;
pub mod rates;
pub mod schedule;

// Re-export main types for cleaner imports
pub use rates::{CurrencyRecord, RateProvider, RateTable};
pub use schedule::RefreshSchedule;
