//! Hit evaluation - matches targets against extracted modifier lines.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::pattern::{CompiledMatcher, LineMatch, compile};
use crate::catalog::Modifier;
use crate::error::{Result, RollError};

/// A user-selected modifier with optional numeric acceptance bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub modifier: Modifier,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TargetSpec {
    pub fn new(modifier: Modifier) -> Self {
        Self {
            modifier,
            min: None,
            max: None,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn clear_bounds(&mut self) {
        self.min = None;
        self.max = None;
    }

    /// Whether a captured value passes both bounds
    pub fn in_range(&self, value: f64) -> bool {
        if self.min.is_some_and(|min| value < min) {
            return false;
        }
        if self.max.is_some_and(|max| value > max) {
            return false;
        }
        true
    }
}

/// Aggregation rule deciding when enough targets matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Every target must be satisfied
    All,
    /// At least `k` targets must be satisfied
    AtLeast(usize),
}

impl Rule {
    /// Reject a `k` outside `[1, target_count]`.
    pub fn validate(&self, target_count: usize) -> Result<()> {
        match *self {
            Rule::All => Ok(()),
            Rule::AtLeast(k) if k >= 1 && k <= target_count => Ok(()),
            Rule::AtLeast(k) => Err(RollError::Config(format!(
                "k must lie in [1, {}], got {}",
                target_count, k
            ))),
        }
    }

    fn is_hit(&self, satisfied: usize, total: usize) -> bool {
        match *self {
            Rule::All => total > 0 && satisfied == total,
            Rule::AtLeast(k) => satisfied >= k,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::All => write!(f, "all"),
            Rule::AtLeast(k) => write!(f, "at least {}", k),
        }
    }
}

/// One satisfied target.
#[derive(Debug, Clone, PartialEq)]
pub struct HitOutcome {
    pub target_index: usize,
    pub matched_value: Option<f64>,
    pub description: String,
}

impl HitOutcome {
    /// `description (value)` for numeric matches, the bare description otherwise
    pub fn detail(&self) -> String {
        match self.matched_value {
            Some(value) => format!("{} ({:?})", self.description, value),
            None => self.description.clone(),
        }
    }
}

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub hit: bool,
    pub satisfied: usize,
    pub outcomes: Vec<HitOutcome>,
}

impl Evaluation {
    pub fn details(&self) -> Vec<String> {
        self.outcomes.iter().map(HitOutcome::detail).collect()
    }
}

/// Evaluator with matchers compiled once per target for the life of a run.
#[derive(Debug, Clone)]
pub struct Evaluator {
    targets: Arc<[TargetSpec]>,
    compiled: Vec<Vec<CompiledMatcher>>,
    rule: Rule,
}

impl Evaluator {
    /// Compile every target's matchers. Fails if the rule is invalid for the target count.
    pub fn new(targets: Arc<[TargetSpec]>, rule: Rule) -> Result<Self> {
        rule.validate(targets.len())?;
        let compiled = targets.iter().map(compile_target).collect();
        Ok(Self {
            targets,
            compiled,
            rule,
        })
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn targets(&self) -> &[TargetSpec] {
        &self.targets
    }

    /// Evaluate extracted lines against every target, in target order.
    pub fn evaluate<S: AsRef<str>>(&self, lines: &[S]) -> Evaluation {
        let outcomes: Vec<HitOutcome> = self
            .targets
            .iter()
            .zip(&self.compiled)
            .enumerate()
            .filter_map(|(index, (target, matchers))| check_target(index, target, matchers, lines))
            .collect();

        let satisfied = outcomes.len();
        Evaluation {
            hit: self.rule.is_hit(satisfied, self.targets.len()),
            satisfied,
            outcomes,
        }
    }
}

/// One-shot evaluation compiling matchers on the fly.
pub fn evaluate<S: AsRef<str>>(lines: &[S], targets: &[TargetSpec], rule: Rule) -> Result<Evaluation> {
    let evaluator = Evaluator::new(Arc::from(targets), rule)?;
    Ok(evaluator.evaluate(lines))
}

fn compile_target(target: &TargetSpec) -> Vec<CompiledMatcher> {
    target
        .modifier
        .matchers
        .iter()
        .map(|m| compile(&m.string))
        .collect()
}

fn check_target<S: AsRef<str>>(
    index: usize,
    target: &TargetSpec,
    matchers: &[CompiledMatcher],
    lines: &[S],
) -> Option<HitOutcome> {
    for matcher in matchers {
        // The first matching line decides this matcher.
        let Some(found) = lines.iter().find_map(|line| matcher.match_line(line.as_ref())) else {
            continue;
        };

        let accepted = match found {
            LineMatch::Literal => true,
            LineMatch::Value(value) => target.in_range(value),
        };
        if accepted {
            return Some(HitOutcome {
                target_index: index,
                matched_value: found.value(),
                description: target.modifier.description().to_string(),
            });
        }
    }
    None
}
