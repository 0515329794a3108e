use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single measured fact about the subject under review.
///
/// Values are captured once when the review request is built and never
/// mutated afterwards. Integer and float values compare numerically
/// against each other in trigger predicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl SignalValue {
    /// Numeric view of the value, promoting integers to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Int(n) => Some(*n as f64),
            SignalValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SignalValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for SignalValue {
    fn from(n: i64) -> Self {
        SignalValue::Int(n)
    }
}

impl From<f64> for SignalValue {
    fn from(f: f64) -> Self {
        SignalValue::Float(f)
    }
}

impl From<bool> for SignalValue {
    fn from(b: bool) -> Self {
        SignalValue::Bool(b)
    }
}

impl From<&str> for SignalValue {
    fn from(s: &str) -> Self {
        SignalValue::Text(s.to_string())
    }
}

impl From<String> for SignalValue {
    fn from(s: String) -> Self {
        SignalValue::Text(s)
    }
}

impl std::fmt::Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalValue::Int(n) => write!(f, "{n}"),
            SignalValue::Float(x) => write!(f, "{x}"),
            SignalValue::Bool(b) => write!(f, "{b}"),
            SignalValue::Text(s) => f.write_str(s),
        }
    }
}

/// Immutable snapshot of signals captured for one review request.
///
/// Built once via [`SignalSet::with`] or `FromIterator`, then treated as
/// read-only by every downstream component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    signals: BTreeMap<String, SignalValue>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion; later values for the same key win.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SignalValue>) -> Self {
        self.signals.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&SignalValue> {
        self.signals.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.signals.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }
}

impl FromIterator<(String, SignalValue)> for SignalSet {
    fn from_iter<I: IntoIterator<Item = (String, SignalValue)>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

/// Severity category of a finding. Ordering is the severity rank used
/// when ranking gated findings: `Suggestion < Important < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Suggestion,
    Important,
    Critical,
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(FindingCategory, &str)] = &[
            (FindingCategory::Suggestion, "Suggestion"),
            (FindingCategory::Important, "Important"),
            (FindingCategory::Critical, "Critical"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}

/// Optional file/line reference attached to a finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A single observation produced by an analyzer.
///
/// Immutable after creation. The confidence score is clamped to `[0, 1]`
/// at construction so the gate never sees out-of-range values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub confidence: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub source_analyzer: String,
}

impl Finding {
    pub fn new(category: FindingCategory, confidence: f64, message: impl Into<String>) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            message: message.into(),
            location: None,
            source_analyzer: String::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Stamp the producing analyzer's registered identifier. The engine
    /// applies this after each run, so analyzer implementations do not
    /// need to know their registry id.
    pub fn with_source(mut self, analyzer: impl Into<String>) -> Self {
        self.source_analyzer = analyzer.into();
        self
    }
}

/// Opaque handle to the thing being reviewed.
///
/// Analyzers resolve the handle themselves (a diff, a file set, a commit
/// range); the engine never interprets its content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}
