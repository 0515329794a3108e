//! Analyzer plugin contract and registry.
//!
//! Analyzers are external collaborators: opaque units of work that take a
//! subject handle and return findings. The engine only depends on this
//! contract and never looks inside an analyzer or the subject.

use crate::core::{Finding, Subject};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod mock;

/// Explicit failure returned by an analyzer run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AnalyzerError {
    pub message: String,
}

impl AnalyzerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A pluggable unit of analysis.
///
/// Implementations may be slow and may fail; they must be safe to invoke
/// concurrently against the same subject (no shared mutable state between
/// analyzers). The engine runs each call on a blocking task with a
/// per-call timeout, so implementations are free to block.
pub trait Analyzer: Send + Sync {
    fn run(&self, subject: &Subject) -> Result<Vec<Finding>, AnalyzerError>;
}

impl std::fmt::Debug for dyn Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<dyn Analyzer>")
    }
}

/// Identifier → analyzer mapping, constructed once at startup and
/// read-only afterwards. Shared by reference across concurrent report
/// calls; immutability is what makes that safe without locking.
#[derive(Debug, Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analyzer under an identifier. Later registrations for
    /// the same identifier replace earlier ones.
    pub fn register(&mut self, id: impl Into<String>, analyzer: impl Analyzer + 'static) {
        self.analyzers.insert(id.into(), Arc::new(analyzer));
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.analyzers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Resolve a list of identifiers to their implementations, preserving
    /// order. An unknown identifier is a configuration error, surfaced
    /// before any analyzer runs.
    pub fn resolve(
        &self,
        ids: &[String],
    ) -> crate::errors::Result<Vec<(String, Arc<dyn Analyzer>)>> {
        ids.iter()
            .map(|id| {
                self.get(id)
                    .map(|analyzer| (id.clone(), analyzer))
                    .ok_or_else(|| crate::errors::EngineError::UnknownAnalyzer(id.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::mock::StaticAnalyzer;
    use super::*;
    use crate::core::FindingCategory;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = AnalyzerRegistry::new();
        registry.register("style", StaticAnalyzer::empty());
        registry.register(
            "correctness",
            StaticAnalyzer::with_finding(FindingCategory::Important, 0.9, "off by one"),
        );

        let resolved = registry
            .resolve(&["style".to_string(), "correctness".to_string()])
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, "style");
        assert_eq!(resolved[1].0, "correctness");
    }

    #[test]
    fn test_unknown_id_is_configuration_error() {
        let registry = AnalyzerRegistry::new();
        let err = registry.resolve(&["ghost".to_string()]).unwrap_err();
        assert_eq!(
            err,
            crate::errors::EngineError::UnknownAnalyzer("ghost".to_string())
        );
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let mut registry = AnalyzerRegistry::new();
        registry.register("style", StaticAnalyzer::empty());
        registry.register(
            "style",
            StaticAnalyzer::with_finding(FindingCategory::Suggestion, 0.5, "nit"),
        );
        assert_eq!(registry.len(), 1);

        let analyzer = registry.get("style").unwrap();
        let findings = analyzer.run(&Subject::new("pr-1")).unwrap();
        assert_eq!(findings.len(), 1);
    }
}
