//! Deterministic analyzers for tests and embedder harnesses.
//!
//! Real analyzers resolve the subject handle themselves (read a diff, walk
//! a file set); these stand-ins let the engine's dispatch, timeout, and
//! failure paths be exercised without any of that.

use super::{Analyzer, AnalyzerError};
use crate::core::{Finding, FindingCategory, Subject};
use std::time::Duration;

/// Returns a fixed list of findings on every run.
pub struct StaticAnalyzer {
    findings: Vec<Finding>,
}

impl StaticAnalyzer {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_finding(category: FindingCategory, confidence: f64, message: &str) -> Self {
        Self::new(vec![Finding::new(category, confidence, message)])
    }
}

impl Analyzer for StaticAnalyzer {
    fn run(&self, _subject: &Subject) -> Result<Vec<Finding>, AnalyzerError> {
        Ok(self.findings.clone())
    }
}

/// Always returns an explicit error.
pub struct FailingAnalyzer {
    message: String,
}

impl FailingAnalyzer {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Analyzer for FailingAnalyzer {
    fn run(&self, _subject: &Subject) -> Result<Vec<Finding>, AnalyzerError> {
        Err(AnalyzerError::new(self.message.clone()))
    }
}

/// Sleeps for a fixed duration before returning its findings. Pair with a
/// shorter per-call timeout to exercise the timeout path.
pub struct SlowAnalyzer {
    delay: Duration,
    findings: Vec<Finding>,
}

impl SlowAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            findings: Vec::new(),
        }
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }
}

impl Analyzer for SlowAnalyzer {
    fn run(&self, _subject: &Subject) -> Result<Vec<Finding>, AnalyzerError> {
        std::thread::sleep(self.delay);
        Ok(self.findings.clone())
    }
}

/// Panics on every run; the engine must record this as a failure rather
/// than crash.
pub struct PanickingAnalyzer;

impl Analyzer for PanickingAnalyzer {
    fn run(&self, _subject: &Subject) -> Result<Vec<Finding>, AnalyzerError> {
        panic!("analyzer blew up");
    }
}

/// Closure-backed analyzer for one-off behavior in tests.
pub struct FnAnalyzer<F>
where
    F: Fn(&Subject) -> Result<Vec<Finding>, AnalyzerError> + Send + Sync,
{
    f: F,
}

impl<F> FnAnalyzer<F>
where
    F: Fn(&Subject) -> Result<Vec<Finding>, AnalyzerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Analyzer for FnAnalyzer<F>
where
    F: Fn(&Subject) -> Result<Vec<Finding>, AnalyzerError> + Send + Sync,
{
    fn run(&self, subject: &Subject) -> Result<Vec<Finding>, AnalyzerError> {
        (self.f)(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_analyzer_returns_same_findings() {
        let analyzer = StaticAnalyzer::with_finding(FindingCategory::Critical, 0.95, "sql injection");
        let subject = Subject::new("pr-7");
        let first = analyzer.run(&subject).unwrap();
        let second = analyzer.run(&subject).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_failing_analyzer_reports_message() {
        let analyzer = FailingAnalyzer::new("could not resolve diff");
        let err = analyzer.run(&Subject::new("pr-7")).unwrap_err();
        assert_eq!(err.message, "could not resolve diff");
    }

    #[test]
    fn test_fn_analyzer_sees_subject() {
        let analyzer = FnAnalyzer::new(|subject: &Subject| {
            Ok(vec![Finding::new(
                FindingCategory::Suggestion,
                0.6,
                format!("looked at {}", subject.id),
            )])
        });
        let findings = analyzer.run(&Subject::new("pr-42")).unwrap();
        assert_eq!(findings[0].message, "looked at pr-42");
    }
}
