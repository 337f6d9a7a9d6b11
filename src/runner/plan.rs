//! Frozen inputs of one automation run.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, RollError};
use crate::matching::{Evaluator, Rule, TargetSpec};

/// Default pause between iterations
pub const DEFAULT_LOOP_DELAY: Duration = Duration::from_millis(200);

/// Targets, rule, and timing captured at start.
///
/// Targets are copied in, so edits made by the driver after `new` never reach
/// an in-flight run. Matchers are compiled once here for the run's lifetime.
#[derive(Debug, Clone)]
pub struct RunPlan {
    evaluator: Evaluator,
    delay: Duration,
}

impl RunPlan {
    /// Validate and freeze a run configuration.
    pub fn new(targets: Vec<TargetSpec>, rule: Rule, delay: Duration) -> Result<Self> {
        if targets.is_empty() {
            return Err(RollError::Config("at least one target is required".into()));
        }
        let targets: Arc<[TargetSpec]> = Arc::from(targets);
        let evaluator = Evaluator::new(targets, rule)?;
        Ok(Self { evaluator, delay })
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn targets(&self) -> &[TargetSpec] {
        self.evaluator.targets()
    }

    pub fn rule(&self) -> Rule {
        self.evaluator.rule()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
