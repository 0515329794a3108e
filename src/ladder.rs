//! Capability ladder: ordered levels with trigger conditions.
//!
//! The ladder answers "how much machinery does this review need". Levels
//! are evaluated top-down so the highest applicable rung wins, and analyzer
//! sets are cumulative: selecting rank N pulls in the analyzers of every
//! lower rank unless a level opts out with `exclusive`.

use crate::core::SignalSet;
use crate::errors::{EngineError, Result};
use crate::predicate::Trigger;
use serde::{Deserialize, Serialize};

/// One rung of the ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// 0 is the base/no-op level; higher means more machinery.
    pub rank: u32,
    pub name: String,
    /// Analyzer identifiers applicable at this level.
    #[serde(default)]
    pub analyzers: Vec<String>,
    /// When set, this level's analyzer set replaces the cumulative set
    /// from lower ranks instead of extending it.
    #[serde(default)]
    pub exclusive: bool,
    // Last field so TOML serialization emits values before the sub-table.
    pub trigger: Trigger,
}

impl Level {
    pub fn new(rank: u32, name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            rank,
            name: name.into(),
            trigger,
            analyzers: Vec::new(),
            exclusive: false,
        }
    }

    pub fn with_analyzers<I, S>(mut self, analyzers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analyzers = analyzers.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// Validated, ordered list of levels.
///
/// Construction enforces the ladder invariants, so every `Ladder` value in
/// circulation is well-formed: non-empty, exactly one rank-0 base with an
/// always-true trigger, ranks strictly increasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Level>", into = "Vec<Level>")]
pub struct Ladder {
    levels: Vec<Level>,
}

impl Ladder {
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        validate(&levels)?;
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// The rank-0 fallback level.
    pub fn base(&self) -> &Level {
        &self.levels[0]
    }

    /// Pick the highest rung whose trigger holds.
    ///
    /// Triggers are evaluated in descending rank order and the first match
    /// wins; the base level's always-true trigger guarantees a result.
    /// Pure and deterministic: no I/O, no side effects.
    pub fn select_level(&self, signals: &SignalSet) -> &Level {
        self.levels
            .iter()
            .rev()
            .find(|level| level.trigger.eval(signals))
            .unwrap_or_else(|| self.base())
    }

    /// Resolve the cumulative analyzer set for a selected level:
    /// every analyzer from rank 0 up through `level.rank`, deduplicated,
    /// declaration order preserved. An `exclusive` level contributes only
    /// its own list.
    pub fn analyzers_for(&self, level: &Level) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::new();
        let candidates: Vec<&str> = if level.exclusive {
            level.analyzers.iter().map(String::as_str).collect()
        } else {
            self.levels
                .iter()
                .filter(|l| l.rank <= level.rank)
                .flat_map(|l| l.analyzers.iter().map(String::as_str))
                .collect()
        };
        for id in candidates {
            if !resolved.iter().any(|seen| seen == id) {
                resolved.push(id.to_string());
            }
        }
        resolved
    }
}

impl TryFrom<Vec<Level>> for Ladder {
    type Error = EngineError;

    fn try_from(levels: Vec<Level>) -> Result<Self> {
        Ladder::new(levels)
    }
}

impl From<Ladder> for Vec<Level> {
    fn from(ladder: Ladder) -> Self {
        ladder.levels
    }
}

fn validate(levels: &[Level]) -> Result<()> {
    let first = levels
        .first()
        .ok_or_else(|| EngineError::MalformedLadder("ladder has no levels".to_string()))?;

    if first.rank != 0 {
        return Err(EngineError::MalformedLadder(format!(
            "first level '{}' has rank {}, expected a rank-0 base level",
            first.name, first.rank
        )));
    }

    if !first.trigger.is_always() {
        return Err(EngineError::MalformedLadder(format!(
            "base level '{}' must have an always-true trigger",
            first.name
        )));
    }

    for pair in levels.windows(2) {
        if pair[1].rank <= pair[0].rank {
            return Err(EngineError::MalformedLadder(format!(
                "ranks must be strictly increasing: '{}' (rank {}) follows '{}' (rank {})",
                pair[1].name, pair[1].rank, pair[0].name, pair[0].rank
            )));
        }
    }

    Ok(())
}
