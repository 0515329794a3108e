//! Trigger predicates over signal sets, represented as data.
//!
//! A trigger is a small tagged expression tree (comparisons plus boolean
//! combinators), not arbitrary code. Evaluation is total: a missing signal
//! or a type-mismatched comparison evaluates to `false`, never to an error
//! or a panic. This keeps ladder selection pure and makes triggers
//! serializable alongside the rest of the configuration.

use crate::core::{SignalSet, SignalValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison operator for a single signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// Boolean predicate over a [`SignalSet`].
///
/// Ordering comparisons (`Gt`/`Ge`/`Lt`/`Le`) apply to numeric signals
/// only; `Eq`/`Ne` additionally cover booleans and text. `Ne` means
/// "present and not equal"; an absent signal fails every comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Matches every signal set. The required trigger for rank-0 base levels.
    Always,
    Cmp {
        signal: String,
        op: CmpOp,
        value: SignalValue,
    },
    All {
        triggers: Vec<Trigger>,
    },
    Any {
        triggers: Vec<Trigger>,
    },
    Not {
        trigger: Box<Trigger>,
    },
}

impl Trigger {
    /// Convenience constructor for the common comparison case.
    pub fn cmp(signal: impl Into<String>, op: CmpOp, value: impl Into<SignalValue>) -> Self {
        Trigger::Cmp {
            signal: signal.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate against a signal set. Total: never panics, never errors.
    pub fn eval(&self, signals: &SignalSet) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::Cmp { signal, op, value } => signals
                .get(signal)
                .map(|actual| compare(actual, *op, value))
                .unwrap_or(false),
            Trigger::All { triggers } => triggers.iter().all(|t| t.eval(signals)),
            Trigger::Any { triggers } => triggers.iter().any(|t| t.eval(signals)),
            Trigger::Not { trigger } => !trigger.eval(signals),
        }
    }

    /// Structural check that this trigger holds for every possible signal
    /// set. Used to validate rank-0 base levels. Conservative: returns
    /// `false` for trees it cannot prove always-true.
    pub fn is_always(&self) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::All { triggers } => triggers.iter().all(Trigger::is_always),
            Trigger::Any { triggers } => triggers.iter().any(Trigger::is_always),
            _ => false,
        }
    }
}

fn compare(actual: &SignalValue, op: CmpOp, expected: &SignalValue) -> bool {
    match op {
        CmpOp::Eq => values_equal(actual, expected),
        CmpOp::Ne => !values_equal(actual, expected),
        CmpOp::Gt => matches!(numeric_ordering(actual, expected), Some(Ordering::Greater)),
        CmpOp::Ge => matches!(
            numeric_ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CmpOp::Lt => matches!(numeric_ordering(actual, expected), Some(Ordering::Less)),
        CmpOp::Le => matches!(
            numeric_ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn numeric_ordering(actual: &SignalValue, expected: &SignalValue) -> Option<Ordering> {
    match (actual, expected) {
        (SignalValue::Int(a), SignalValue::Int(b)) => Some(a.cmp(b)),
        _ => {
            let a = actual.as_f64()?;
            let b = expected.as_f64()?;
            a.partial_cmp(&b)
        }
    }
}

fn values_equal(actual: &SignalValue, expected: &SignalValue) -> bool {
    match (actual, expected) {
        (SignalValue::Bool(a), SignalValue::Bool(b)) => a == b,
        (SignalValue::Text(a), SignalValue::Text(b)) => a == b,
        (SignalValue::Int(a), SignalValue::Int(b)) => a == b,
        _ => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> SignalSet {
        SignalSet::new()
            .with("lines_changed", 600i64)
            .with("files_changed", 8i64)
            .with("coverage", 0.72)
            .with("has_migrations", true)
            .with("language", "rust")
    }

    #[test]
    fn test_comparison_operators() {
        let s = signals();
        assert!(Trigger::cmp("lines_changed", CmpOp::Gt, 500i64).eval(&s));
        assert!(!Trigger::cmp("lines_changed", CmpOp::Gt, 600i64).eval(&s));
        assert!(Trigger::cmp("lines_changed", CmpOp::Ge, 600i64).eval(&s));
        assert!(Trigger::cmp("coverage", CmpOp::Lt, 0.8).eval(&s));
        assert!(Trigger::cmp("language", CmpOp::Eq, "rust").eval(&s));
        assert!(Trigger::cmp("language", CmpOp::Ne, "python").eval(&s));
        assert!(Trigger::cmp("has_migrations", CmpOp::Eq, true).eval(&s));
    }

    #[test]
    fn test_int_and_float_compare_numerically() {
        let s = signals();
        assert!(Trigger::cmp("lines_changed", CmpOp::Gt, 599.5).eval(&s));
        assert!(Trigger::cmp("coverage", CmpOp::Ge, 0i64).eval(&s));
    }

    #[test]
    fn test_missing_signal_is_false_not_error() {
        let s = signals();
        assert!(!Trigger::cmp("nonexistent", CmpOp::Gt, 0i64).eval(&s));
        assert!(!Trigger::cmp("nonexistent", CmpOp::Ne, 0i64).eval(&s));
    }

    #[test]
    fn test_type_mismatch_is_false_not_error() {
        let s = signals();
        // Ordering comparison on a text signal
        assert!(!Trigger::cmp("language", CmpOp::Gt, 3i64).eval(&s));
        // Equality across unrelated kinds
        assert!(!Trigger::cmp("has_migrations", CmpOp::Eq, "true").eval(&s));
    }

    #[test]
    fn test_boolean_combinators() {
        let s = signals();
        let big_change = Trigger::Any {
            triggers: vec![
                Trigger::cmp("lines_changed", CmpOp::Gt, 500i64),
                Trigger::cmp("files_changed", CmpOp::Gt, 20i64),
            ],
        };
        assert!(big_change.eval(&s));

        let risky = Trigger::All {
            triggers: vec![big_change, Trigger::cmp("coverage", CmpOp::Lt, 0.8)],
        };
        assert!(risky.eval(&s));

        assert!(!Trigger::Not {
            trigger: Box::new(risky)
        }
        .eval(&s));
    }

    #[test]
    fn test_empty_combinators() {
        let s = signals();
        assert!(Trigger::All { triggers: vec![] }.eval(&s));
        assert!(!Trigger::Any { triggers: vec![] }.eval(&s));
    }

    #[test]
    fn test_is_always_structural() {
        assert!(Trigger::Always.is_always());
        assert!(Trigger::All {
            triggers: vec![Trigger::Always, Trigger::Always]
        }
        .is_always());
        assert!(Trigger::Any {
            triggers: vec![Trigger::cmp("x", CmpOp::Gt, 1i64), Trigger::Always]
        }
        .is_always());
        assert!(!Trigger::cmp("x", CmpOp::Gt, 1i64).is_always());
        assert!(!Trigger::Not {
            trigger: Box::new(Trigger::Always)
        }
        .is_always());
    }

    #[test]
    fn test_trigger_deserializes_from_toml() {
        let toml = r#"
            kind = "any"

            [[triggers]]
            kind = "cmp"
            signal = "lines_changed"
            op = "gt"
            value = 500

            [[triggers]]
            kind = "cmp"
            signal = "files_changed"
            op = "gt"
            value = 5
        "#;
        let trigger: Trigger = toml::from_str(toml).unwrap();
        assert!(trigger.eval(&signals()));
        assert!(!trigger.eval(&SignalSet::new().with("files_changed", 2i64)));
    }
}
