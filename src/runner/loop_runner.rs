//! Automation loop - rolls until the targets hit or the run is cancelled.
//!
//! Each iteration:
//! 1. Checks the cancellation flag (cancellation always wins)
//! 2. Performs one scripted input cycle
//! 3. Snapshots the item text
//! 4. Extracts the modifier block and evaluates it
//! 5. Reports the iteration to the log and progress sinks
//! 6. On a hit: sets the cancellation flag and stops
//! 7. Otherwise sleeps for the plan's delay

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use log::{info, warn};

use super::collaborators::{ItemAction, TextSource};
use super::context::{LoopState, RunContext};
use super::plan::RunPlan;
use super::sinks::{IterationReport, LogSink, ProgressSink, summary_record};
use crate::matching::{Evaluation, extract};

/// Terminal artifact of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub iterations: u64,
    pub hit: bool,
    /// Matched target details from the hitting iteration
    pub details: Vec<String>,
    /// `HitDetected` or `Cancelled`
    pub state: LoopState,
    pub elapsed: Duration,
}

/// Drives the action, snapshot, and evaluation cycle.
pub struct AutomationLoop<A, S>
where
    A: ItemAction,
    S: TextSource,
{
    action: Arc<A>,
    source: Arc<S>,
    log: Arc<dyn LogSink>,
    progress: Arc<dyn ProgressSink>,
}

impl<A, S> AutomationLoop<A, S>
where
    A: ItemAction,
    S: TextSource,
{
    pub fn new(
        action: Arc<A>,
        source: Arc<S>,
        log: Arc<dyn LogSink>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            action,
            source,
            log,
            progress,
        }
    }

    /// Run until a hit or cancellation. Never fails on a single bad iteration.
    pub async fn run(&self, plan: &RunPlan, ctx: &RunContext) -> RunResult {
        ctx.set_state(LoopState::Running);
        let started = Instant::now();
        self.progress.on_message(&format!(
            "Rolling started: {} (rule: {}, targets: {})",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            plan.rule(),
            plan.targets().len()
        ));

        let mut iteration = 0u64;
        let mut details = Vec::new();
        let terminal = loop {
            if ctx.is_cancelled() {
                break LoopState::Cancelled;
            }

            iteration += 1;
            ctx.publish_iteration(iteration);

            let report = self.iterate(plan, iteration).await;
            self.record(&report);

            if report.hit() {
                details = report.evaluation.details();
                self.progress.on_message("Target condition hit, stopping.");
                ctx.cancel();
                break LoopState::HitDetected;
            }

            tokio::time::sleep(plan.delay()).await;
        };

        ctx.set_state(terminal);
        let result = RunResult {
            iterations: iteration,
            hit: terminal == LoopState::HitDetected,
            details,
            state: terminal,
            elapsed: started.elapsed(),
        };
        self.finish(&result);
        ctx.set_state(LoopState::Stopped);
        result
    }

    async fn iterate(&self, plan: &RunPlan, iteration: u64) -> IterationReport {
        let miss = |error: String| IterationReport {
            iteration,
            lines: 0,
            evaluation: Evaluation {
                hit: false,
                satisfied: 0,
                outcomes: Vec::new(),
            },
            error: Some(error),
        };

        if let Err(e) = self.action.perform(iteration).await {
            warn!("Iteration {}: {}", iteration, e);
            return miss(e.to_string());
        }

        let text = match self.source.snapshot().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Iteration {}: {}", iteration, e);
                return miss(e.to_string());
            }
        };

        let lines = extract(&text);
        IterationReport {
            iteration,
            lines: lines.len(),
            evaluation: plan.evaluator().evaluate(&lines),
            error: None,
        }
    }

    fn record(&self, report: &IterationReport) {
        if let Err(e) = self.log.append(&report.to_record(Local::now())) {
            warn!("Failed to append roll log: {}", e);
        }
        self.progress.on_iteration(report);
    }

    fn finish(&self, result: &RunResult) {
        if let Err(e) = self.log.append(&summary_record(Local::now(), result)) {
            warn!("Failed to append roll summary: {}", e);
        }
        info!(
            "Run ended ({}) after {} iterations in {:?}",
            result.state, result.iterations, result.elapsed
        );
        self.progress.on_message(&format!(
            "Rolled {} times in {:.2}s",
            result.iterations,
            result.elapsed.as_secs_f64()
        ));
        self.progress.on_complete(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Modifier;
    use crate::error::{Result, RollError};
    use crate::matching::{Rule, TargetSpec};
    use crate::runner::sinks::MemoryLogSink;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    struct CountingAction {
        calls: AtomicU64,
        fail_on: Option<u64>,
    }

    impl CountingAction {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl ItemAction for CountingAction {
        async fn perform(&self, iteration: u64) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(iteration) {
                return Err(RollError::Action("input blocked".into()));
            }
            Ok(())
        }
    }

    /// Returns queued snapshots in order, then repeats the last one.
    struct ScriptedSource {
        snapshots: Mutex<Vec<Result<String>>>,
    }

    impl ScriptedSource {
        fn new(snapshots: Vec<Result<String>>) -> Self {
            let mut snapshots = snapshots;
            snapshots.reverse();
            Self {
                snapshots: Mutex::new(snapshots),
            }
        }
    }

    #[async_trait]
    impl TextSource for ScriptedSource {
        async fn snapshot(&self) -> Result<String> {
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.len() > 1 {
                return snapshots.pop().unwrap();
            }
            match snapshots.last() {
                Some(Ok(text)) => Ok(text.clone()),
                _ => Err(RollError::Snapshot("exhausted".into())),
            }
        }
    }

    /// Cancels the context after a number of iterations.
    struct CancelAfter {
        ctx: Arc<RunContext>,
        after: u64,
        completions: AtomicU32,
        messages: Mutex<Vec<String>>,
    }

    impl ProgressSink for CancelAfter {
        fn on_iteration(&self, report: &IterationReport) {
            if report.iteration >= self.after {
                self.ctx.cancel();
            }
        }

        fn on_message(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn on_complete(&self, _result: &RunResult) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn item(body: &str) -> Result<String> {
        Ok(format!("Rarity: Magic\n--------\n{}\n--------\nPlace into a socket", body))
    }

    fn plan() -> RunPlan {
        let target = TargetSpec::new(Modifier::new("X", ["Adds # Energy Shield"])).with_min(5.0);
        RunPlan::new(vec![target], Rule::All, Duration::ZERO).unwrap()
    }

    fn progress(ctx: &Arc<RunContext>, after: u64) -> Arc<CancelAfter> {
        Arc::new(CancelAfter {
            ctx: ctx.clone(),
            after,
            completions: AtomicU32::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_hit_on_first_iteration() {
        let ctx = Arc::new(RunContext::new());
        let log = Arc::new(MemoryLogSink::new());
        let sink = progress(&ctx, u64::MAX);
        let runner = AutomationLoop::new(
            Arc::new(CountingAction::new()),
            Arc::new(ScriptedSource::new(vec![item("Adds 8 Energy Shield")])),
            log.clone(),
            sink.clone(),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert!(result.hit);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.state, LoopState::HitDetected);
        assert_eq!(result.details, vec!["Adds # Energy Shield (8.0)"]);
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.state(), LoopState::Stopped);
        assert_eq!(sink.completions.load(Ordering::SeqCst), 1);
        let messages = sink.messages.lock().unwrap().clone();
        assert!(messages.iter().any(|m| m.contains("Target condition hit")));

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].contains("| #1 | hit=true | details=Adds # Energy Shield (8.0) | lines=1"));
        assert!(records[1].contains("| summary | iterations=1 | hit=true"));
    }

    #[tokio::test]
    async fn test_misses_until_hit() {
        let ctx = Arc::new(RunContext::new());
        let log = Arc::new(MemoryLogSink::new());
        let action = Arc::new(CountingAction::new());
        let runner = AutomationLoop::new(
            action.clone(),
            Arc::new(ScriptedSource::new(vec![
                item("Adds 2 Energy Shield"),
                item("+30 to maximum Life"),
                item("Adds 6 Energy Shield"),
            ])),
            log.clone(),
            progress(&ctx, u64::MAX),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert!(result.hit);
        assert_eq!(result.iterations, 3);
        assert_eq!(action.calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.iterations(), 3);
        assert_eq!(log.records().len(), 4);
    }

    #[tokio::test]
    async fn test_cancel_before_start_performs_no_action() {
        let ctx = Arc::new(RunContext::new());
        ctx.cancel();
        let action = Arc::new(CountingAction::new());
        let sink = progress(&ctx, u64::MAX);
        let runner = AutomationLoop::new(
            action.clone(),
            Arc::new(ScriptedSource::new(vec![item("Adds 8 Energy Shield")])),
            Arc::new(MemoryLogSink::new()),
            sink.clone(),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert!(!result.hit);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.state, LoopState::Cancelled);
        assert_eq!(action.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_run() {
        let ctx = Arc::new(RunContext::new());
        let action = Arc::new(CountingAction::new());
        let runner = AutomationLoop::new(
            action.clone(),
            Arc::new(ScriptedSource::new(vec![item("Adds 1 Energy Shield")])),
            Arc::new(MemoryLogSink::new()),
            progress(&ctx, 2),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert_eq!(result.state, LoopState::Cancelled);
        assert_eq!(result.iterations, 2);
        assert!(result.details.is_empty());
        assert_eq!(action.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collaborator_failures_are_misses() {
        let ctx = Arc::new(RunContext::new());
        let log = Arc::new(MemoryLogSink::new());
        let action = Arc::new(CountingAction {
            calls: AtomicU64::new(0),
            fail_on: Some(1),
        });
        let runner = AutomationLoop::new(
            action,
            Arc::new(ScriptedSource::new(vec![
                Err(RollError::Snapshot("clipboard locked".into())),
                item("Adds 9 Energy Shield"),
            ])),
            log.clone(),
            progress(&ctx, u64::MAX),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert!(result.hit);
        assert_eq!(result.iterations, 3);
        let records = log.records();
        assert!(records[0].contains("hit=false") && records[0].contains("error=Action error: input blocked"));
        assert!(records[1].contains("error=Snapshot error: clipboard locked"));
        assert!(records[2].contains("hit=true"));
    }

    #[tokio::test]
    async fn test_snapshot_without_sections_is_miss() {
        let ctx = Arc::new(RunContext::new());
        let log = Arc::new(MemoryLogSink::new());
        let runner = AutomationLoop::new(
            Arc::new(CountingAction::new()),
            Arc::new(ScriptedSource::new(vec![Ok("Adds 8 Energy Shield".to_string())])),
            log.clone(),
            progress(&ctx, 1),
        );

        let result = runner.run(&plan(), &ctx).await;

        assert!(!result.hit);
        assert!(log.records()[0].contains("hit=false | details= | lines=0"));
    }
}
