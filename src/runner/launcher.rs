//! Starts the automation loop on a single background worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use tokio::task::JoinHandle;

use super::collaborators::{ItemAction, TextSource};
use super::context::{LoopState, RunContext};
use super::loop_runner::{AutomationLoop, RunResult};
use super::plan::RunPlan;
use crate::error::{Result, RollError};

/// Allows at most one running automation loop at a time.
///
/// The limit is per `Launcher` (clones share it). Separate `Launcher::new()`
/// instances or direct calls to [`AutomationLoop::run`] are not tracked, so a
/// process wanting a single active run keeps exactly one launcher.
#[derive(Debug, Default, Clone)]
pub struct Launcher {
    active: Arc<AtomicBool>,
}

/// Clears the launcher's active flag when the worker ends, even on panic.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn the worker. Fails with `LoopActive` if a run is still going.
    pub fn start<A, S>(&self, runner: Arc<AutomationLoop<A, S>>, plan: RunPlan) -> Result<RunHandle>
    where
        A: ItemAction + 'static,
        S: TextSource + 'static,
    {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RollError::LoopActive);
        }

        let guard = ActiveGuard(self.active.clone());
        let ctx = Arc::new(RunContext::new());
        let worker_ctx = ctx.clone();
        info!("Starting automation loop with {} targets", plan.targets().len());

        let join = tokio::spawn(async move {
            let _guard = guard;
            runner.run(&plan, &worker_ctx).await
        });

        Ok(RunHandle { ctx, join })
    }
}

/// Driver-side handle on a running loop.
#[derive(Debug)]
pub struct RunHandle {
    ctx: Arc<RunContext>,
    join: JoinHandle<RunResult>,
}

impl RunHandle {
    pub fn context(&self) -> Arc<RunContext> {
        self.ctx.clone()
    }

    /// Request cancellation; takes effect before the next scripted action
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    pub fn iterations(&self) -> u64 {
        self.ctx.iterations()
    }

    pub fn state(&self) -> LoopState {
        self.ctx.state()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker to finish.
    pub async fn wait(self) -> Result<RunResult> {
        self.join
            .await
            .map_err(|e| RollError::Worker(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Modifier;
    use crate::matching::{Rule, TargetSpec};
    use crate::runner::sinks::{LogProgress, MemoryLogSink};
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoopAction;

    #[async_trait]
    impl ItemAction for NoopAction {
        async fn perform(&self, _iteration: u64) -> Result<()> {
            Ok(())
        }
    }

    struct FixedSource(String);

    #[async_trait]
    impl TextSource for FixedSource {
        async fn snapshot(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn runner(text: &str) -> Arc<AutomationLoop<NoopAction, FixedSource>> {
        Arc::new(AutomationLoop::new(
            Arc::new(NoopAction),
            Arc::new(FixedSource(text.to_string())),
            Arc::new(MemoryLogSink::new()),
            Arc::new(LogProgress),
        ))
    }

    fn plan(delay: Duration) -> RunPlan {
        let target = TargetSpec::new(Modifier::new("X", ["Adds # Energy Shield"]));
        RunPlan::new(vec![target], Rule::All, delay).unwrap()
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let launcher = Launcher::new();
        let handle = launcher
            .start(runner("no modifiers"), plan(Duration::from_millis(10)))
            .unwrap();
        assert!(launcher.is_active());

        let second = launcher.start(runner("no modifiers"), plan(Duration::ZERO));
        assert!(matches!(second, Err(RollError::LoopActive)));
        assert!(!handle.is_finished());

        handle.cancel();
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let result = handle.wait().await.unwrap();
        assert_eq!(result.state, LoopState::Cancelled);
        assert!(!launcher.is_active());
    }

    #[tokio::test]
    async fn test_restart_after_completion() {
        let launcher = Launcher::new();
        let text = "a\n--------\nAdds 3 Energy Shield\n--------\nb";

        let first = launcher.start(runner(text), plan(Duration::ZERO)).unwrap();
        let result = first.wait().await.unwrap();
        assert!(result.hit);
        assert_eq!(result.iterations, 1);

        let second = launcher.start(runner(text), plan(Duration::ZERO)).unwrap();
        assert!(second.wait().await.unwrap().hit);
    }

    #[tokio::test]
    async fn test_driver_can_poll_iterations() {
        let launcher = Launcher::new();
        let handle = launcher
            .start(runner("nothing here"), plan(Duration::from_millis(5)))
            .unwrap();

        while handle.iterations() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.cancel();
        let ctx = handle.context();
        let result = handle.wait().await.unwrap();

        assert!(result.iterations >= 3);
        assert_eq!(ctx.state(), LoopState::Stopped);
    }
}
