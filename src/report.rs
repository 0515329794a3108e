//! The terminal report artifact: created once, fully immutable,
//! losslessly serializable.

use crate::core::Finding;
use crate::ladder::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an analyzer did not contribute findings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Exceeded its per-call timeout; execution was abandoned.
    Timeout,
    /// The overall report deadline expired before the analyzer finished.
    DeadlineExceeded,
    /// The analyzer panicked.
    Panicked { detail: String },
    /// The analyzer returned an explicit error.
    Failed { detail: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Timeout => f.write_str("timed out"),
            FailureReason::DeadlineExceeded => f.write_str("report deadline exceeded"),
            FailureReason::Panicked { detail } => write!(f, "panicked: {detail}"),
            FailureReason::Failed { detail } => write!(f, "failed: {detail}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerFailure {
    pub analyzer: String,
    pub reason: FailureReason,
}

impl AnalyzerFailure {
    pub fn new(analyzer: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            analyzer: analyzer.into(),
            reason,
        }
    }
}

/// Whether the engine ran a supplementary round, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub escalated: bool,
    pub reason: String,
}

impl EscalationDecision {
    pub fn triggered(reason: impl Into<String>) -> Self {
        Self {
            escalated: true,
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            escalated: false,
            reason: reason.into(),
        }
    }
}

/// Final output of one `produce_report` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub level_rank: u32,
    pub level_name: String,
    /// Gated findings, ranked by severity then confidence.
    pub findings: Vec<Finding>,
    /// Analyzers that completed successfully, in dispatch order.
    pub succeeded: Vec<String>,
    pub failed: Vec<AnalyzerFailure>,
    pub escalation: EscalationDecision,
    /// True when the report was finalized early because the overall
    /// deadline expired; the report is partial but still valid.
    pub deadline_exceeded: bool,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Structural composition only; all filtering and ranking has already
    /// happened by the time a report is assembled.
    pub fn assemble(
        level: &Level,
        findings: Vec<Finding>,
        succeeded: Vec<String>,
        failed: Vec<AnalyzerFailure>,
        escalation: EscalationDecision,
        deadline_exceeded: bool,
    ) -> Self {
        Self {
            level_rank: level.rank,
            level_name: level.name.clone(),
            findings,
            succeeded,
            failed,
            escalation,
            deadline_exceeded,
            timestamp: Utc::now(),
        }
    }

    /// Identifiers of analyzers recorded as failed.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.analyzer.as_str()).collect()
    }
}
