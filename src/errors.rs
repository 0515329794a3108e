//! Shared error types for the engine.
//!
//! Only configuration errors and total failure ever escape
//! [`produce_report`](crate::engine::Engine::produce_report); analyzer-local
//! failures are recorded in the report's failed list instead.

use thiserror::Error;

/// Main error type for reviewgate operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Ladder invariants violated (empty, missing rank-0 base, ranks not
    /// strictly increasing, base trigger not always-true).
    #[error("malformed ladder: {0}")]
    MalformedLadder(String),

    /// Confidence threshold outside `[0, 1]`.
    #[error("confidence threshold {0} is outside [0.0, 1.0]")]
    InvalidThreshold(f64),

    /// A ladder level or escalation rule references an analyzer identifier
    /// the registry does not contain.
    #[error("analyzer '{0}' is not registered")]
    UnknownAnalyzer(String),

    /// Other configuration errors (zero timeout, unparseable config file).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every dispatched analyzer failed, so no report can be produced.
    /// Distinct from an empty-but-valid report: "we could not check
    /// anything" rather than "nothing wrong was found".
    #[error("no analyzers succeeded ({attempted} attempted)")]
    NoAnalyzersSucceeded { attempted: usize },
}

impl EngineError {
    /// Whether this error is fixable by correcting configuration before
    /// any analyzer runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::MalformedLadder(_)
                | EngineError::InvalidThreshold(_)
                | EngineError::UnknownAnalyzer(_)
                | EngineError::Configuration(_)
        )
    }

    /// Process exit code for CLI wrappers: 1 for configuration errors,
    /// 2 for total failure. Success (including partial/degraded reports)
    /// is not represented as an error and maps to 0.
    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            1
        } else {
            2
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
