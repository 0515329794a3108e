//! Confidence gate: suppress low-confidence findings and rank the rest.

use crate::core::Finding;
use crate::errors::{EngineError, Result};

/// Filter findings to those at or above `threshold`, then rank by
/// severity and confidence.
///
/// The threshold must lie in `[0, 1]`; anything else is a configuration
/// error. Findings exactly at the threshold survive.
pub fn gate(mut findings: Vec<Finding>, threshold: f64) -> Result<Vec<Finding>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(EngineError::InvalidThreshold(threshold));
    }
    findings.retain(|f| f.confidence >= threshold);
    rank(&mut findings);
    Ok(findings)
}

/// Stable sort by `(category desc, confidence desc)`.
///
/// Stability is load-bearing: findings with identical category and
/// confidence keep their input order, which is analyzer dispatch order,
/// so report output is deterministic regardless of completion timing.
pub fn rank(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.category
            .cmp(&a.category)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
}
