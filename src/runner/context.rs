//! Shared run context - the only state visible to both the driver and the worker.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Lifecycle of one automation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    HitDetected,
    Cancelled,
    Stopped,
}

impl LoopState {
    /// Whether the worker has left `Running`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopState::HitDetected | LoopState::Cancelled | LoopState::Stopped
        )
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::HitDetected => "hit",
            LoopState::Cancelled => "cancelled",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cancellation flag, published iteration count, and lifecycle state.
///
/// The driver may cancel and poll; only the worker advances the state.
#[derive(Debug)]
pub struct RunContext {
    cancelled: AtomicBool,
    iterations: AtomicU64,
    state: Mutex<LoopState>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            iterations: AtomicU64::new(0),
            state: Mutex::new(LoopState::Idle),
        }
    }

    /// Request the worker to stop before its next action
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Latest iteration number published by the worker
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> LoopState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn publish_iteration(&self, iteration: u64) {
        self.iterations.store(iteration, Ordering::Relaxed);
    }

    pub(crate) fn set_state(&self, next: LoopState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        log::debug!("Run state {} -> {}", *state, next);
        *state = next;
    }
}
