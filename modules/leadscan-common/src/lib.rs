pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BudgetConfig, ForumConfig, KeywordWeight, NotifyConfig, ScanConfig, ScoringConfig, VideoConfig};
pub use error::ConfigError;
pub use types::*;
