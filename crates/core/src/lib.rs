pub mod canonical;
pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use canonical::CanonicalMetric;
pub use config::AppConfig;
pub use error::{MarketPulseError, PulseResult};
pub use table::Table;
