// Export modules for library usage
pub mod analyzers;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod gate;
pub mod io;
pub mod ladder;
pub mod predicate;
pub mod report;

// Re-export commonly used types
pub use crate::analyzers::{Analyzer, AnalyzerError, AnalyzerRegistry};
pub use crate::config::{EngineConfig, EscalationConfig, ReviewConfig};
pub use crate::core::{Finding, FindingCategory, Location, SignalSet, SignalValue, Subject};
pub use crate::engine::Engine;
pub use crate::errors::EngineError;
pub use crate::gate::gate;
pub use crate::io::output::{JsonWriter, OutputWriter};
pub use crate::ladder::{Ladder, Level};
pub use crate::predicate::{CmpOp, Trigger};
pub use crate::report::{AnalyzerFailure, EscalationDecision, FailureReason, Report};
