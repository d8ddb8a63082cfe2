pub mod orchestrator;
pub mod stats;

pub use orchestrator::ScanOrchestrator;
pub use stats::{CycleError, ErrorKind, ScanCycleResult, SourceStats, SourceStatus};
