//! Engine configuration: confidence threshold, timeouts, concurrency
//! bounds, and the escalation rule.
//!
//! Thresholds and escalation triggers are per-invocation configuration,
//! never process-global constants. Everything deserializes from TOML so a
//! ladder plus its engine knobs can ship as one config file.

use crate::errors::{EngineError, Result};
use crate::ladder::Ladder;
use crate::predicate::Trigger;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Secondary rule that decides whether a first-pass report warrants a
/// follow-up round of supplementary analyzers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Supplementary analyzer identifiers dispatched when the trigger
    /// holds. Analyzers that already ran in the first round are skipped.
    #[serde(default)]
    pub analyzers: Vec<String>,
    /// E.g. "lines_changed > 500 OR files_changed > 5".
    pub trigger: Trigger,
}

/// Tunable knobs for report production.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Findings below this confidence are suppressed. Must lie in `[0, 1]`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Per-analyzer-call timeout in milliseconds.
    #[serde(default = "default_analyzer_timeout_ms")]
    pub analyzer_timeout_ms: u64,

    /// Overall deadline for one `produce_report` call, in milliseconds.
    /// Defaults to twice the per-analyzer timeout, which covers the one
    /// permitted escalation round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_deadline_ms: Option<u64>,

    /// Maximum analyzers running at once. `None` means bounded only by
    /// the analyzer-set size, which is the sensible default for the
    /// typical set of under twenty analyzers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<EscalationConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            analyzer_timeout_ms: default_analyzer_timeout_ms(),
            global_deadline_ms: None,
            max_concurrency: None,
            escalation: None,
        }
    }
}

impl EngineConfig {
    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_timeout_ms)
    }

    pub fn global_deadline(&self) -> Duration {
        match self.global_deadline_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(self.analyzer_timeout_ms.saturating_mul(2)),
        }
    }

    /// Fail fast on bad knobs before any analyzer runs.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::InvalidThreshold(self.confidence_threshold));
        }
        if self.analyzer_timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "analyzer_timeout_ms must be positive".to_string(),
            ));
        }
        if self.global_deadline_ms == Some(0) {
            return Err(EngineError::Configuration(
                "global_deadline_ms must be positive".to_string(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(EngineError::Configuration(
                "max_concurrency must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_confidence_threshold() -> f64 {
    0.80
}

fn default_analyzer_timeout_ms() -> u64 {
    30_000
}

/// Top-level configuration document: engine knobs plus the ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Ladder levels, ordered by rank. Validated on deserialization.
    pub ladder: Ladder,
}

impl ReviewConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ReviewConfig = toml::from_str(content)
            .map_err(|e| EngineError::Configuration(format!("invalid config: {e}")))?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::CmpOp;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.confidence_threshold, 0.80);
        assert_eq!(config.analyzer_timeout(), Duration::from_secs(30));
        assert_eq!(config.global_deadline(), Duration::from_secs(60));
        assert!(config.max_concurrency.is_none());
        assert!(config.escalation.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = EngineConfig {
            confidence_threshold: 1.2,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(EngineError::InvalidThreshold(1.2)));

        let config = EngineConfig {
            confidence_threshold: -0.1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = EngineConfig {
            analyzer_timeout_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_explicit_deadline_overrides_doubling() {
        let config = EngineConfig {
            analyzer_timeout_ms: 100,
            global_deadline_ms: Some(450),
            ..EngineConfig::default()
        };
        assert_eq!(config.global_deadline(), Duration::from_millis(450));
    }

    #[test]
    fn test_full_config_from_toml() {
        let toml = r#"
            [engine]
            confidence_threshold = 0.75
            analyzer_timeout_ms = 5000
            max_concurrency = 4

            [engine.escalation]
            analyzers = ["deep-architecture"]

            [engine.escalation.trigger]
            kind = "any"

            [[engine.escalation.trigger.triggers]]
            kind = "cmp"
            signal = "lines_changed"
            op = "gt"
            value = 500

            [[engine.escalation.trigger.triggers]]
            kind = "cmp"
            signal = "files_changed"
            op = "gt"
            value = 5

            [[ladder]]
            rank = 0
            name = "quick"
            analyzers = ["style"]

            [ladder.trigger]
            kind = "always"

            [[ladder]]
            rank = 1
            name = "standard"
            analyzers = ["correctness"]

            [ladder.trigger]
            kind = "cmp"
            signal = "files_changed"
            op = "gt"
            value = 5
        "#;

        let config = ReviewConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.engine.confidence_threshold, 0.75);
        assert_eq!(config.engine.max_concurrency, Some(4));
        assert_eq!(config.ladder.levels().len(), 2);

        let escalation = config.engine.escalation.unwrap();
        assert_eq!(escalation.analyzers, vec!["deep-architecture"]);
        assert!(escalation
            .trigger
            .eval(&crate::core::SignalSet::new().with("lines_changed", 600i64)));
    }

    #[test]
    fn test_malformed_ladder_in_config_rejected() {
        let toml = r#"
            [[ladder]]
            rank = 1
            name = "standard"

            [ladder.trigger]
            kind = "always"
        "#;
        let err = ReviewConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_escalation_trigger_roundtrip() {
        let escalation = EscalationConfig {
            trigger: Trigger::cmp("lines_changed", CmpOp::Gt, 500i64),
            analyzers: vec!["deep".to_string()],
        };
        let toml = toml::to_string(&escalation).unwrap();
        let back: EscalationConfig = toml::from_str(&toml).unwrap();
        assert_eq!(escalation, back);
    }
}
