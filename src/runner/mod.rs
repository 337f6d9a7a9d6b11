//! Automation loop module - the cancellable roll cycle and its collaborators.
//!
//! This module provides:
//! - AutomationLoop for executing one run until a hit or cancellation
//! - Launcher/RunHandle for the single background worker
//! - RunContext with the shared cancellation flag and iteration counter
//! - LogSink/ProgressSink consumer interfaces and concrete sinks
//! - ItemAction/TextSource collaborator interfaces and shell-backed versions

mod collaborators;
mod context;
mod launcher;
mod loop_runner;
mod plan;
mod sinks;

pub use collaborators::{CommandAction, CommandSource, ConfiguredSource, FileSource, ItemAction, TextSource};
pub use context::{LoopState, RunContext};
pub use launcher::{Launcher, RunHandle};
pub use loop_runner::{AutomationLoop, RunResult};
pub use plan::{DEFAULT_LOOP_DELAY, RunPlan};
pub use sinks::{FileLogSink, IterationReport, LogProgress, LogSink, MemoryLogSink, ProgressSink, summary_record};
