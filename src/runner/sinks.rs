//! Consumer interfaces for roll records and progress, plus file and memory sinks.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::error::{Result, RollError};
use crate::matching::Evaluation;

use super::loop_runner::RunResult;

/// What happened in one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: u64,
    /// Number of modifier lines extracted from the snapshot
    pub lines: usize,
    pub evaluation: Evaluation,
    /// Collaborator failure that turned this iteration into a miss
    pub error: Option<String>,
}

impl IterationReport {
    pub fn hit(&self) -> bool {
        self.evaluation.hit
    }

    /// One append-only roll log record.
    pub fn to_record(&self, at: DateTime<Local>) -> String {
        let mut record = format!(
            "{} | #{} | hit={} | details={} | lines={}",
            timestamp(at),
            self.iteration,
            self.evaluation.hit,
            self.evaluation.details().join(","),
            self.lines
        );
        if let Some(error) = &self.error {
            record.push_str(&format!(" | error={}", error));
        }
        record
    }
}

/// Summary record written when a run leaves `Running`.
pub fn summary_record(at: DateTime<Local>, result: &RunResult) -> String {
    format!(
        "{} | summary | iterations={} | hit={} | elapsed={:.3}s",
        timestamp(at),
        result.iterations,
        result.hit,
        result.elapsed.as_secs_f64()
    )
}

fn timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Append-only sink for roll records.
pub trait LogSink: Send + Sync {
    fn append(&self, record: &str) -> Result<()>;
}

/// Progress consumer for the driving UI or CLI.
pub trait ProgressSink: Send + Sync {
    /// Called once per completed iteration
    fn on_iteration(&self, report: &IterationReport);

    /// Free-form status messages (start, stop, failures)
    fn on_message(&self, message: &str);

    /// Completion signal, called exactly once when the run leaves `Running`
    fn on_complete(&self, result: &RunResult);
}

/// Roll log appended to a UTF-8 text file.
pub struct FileLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLogSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLogSink {
    fn append(&self, record: &str) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| RollError::Io(std::io::Error::other(e.to_string())))?;
        writeln!(file, "{}", record)?;
        Ok(())
    }
}

/// In-memory roll log, useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, record: &str) -> Result<()> {
        self.records
            .lock()
            .map_err(|e| RollError::Io(std::io::Error::other(e.to_string())))?
            .push(record.to_string());
        Ok(())
    }
}

/// Progress sink that only forwards to the `log` facade.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_iteration(&self, report: &IterationReport) {
        log::info!(
            "[{}] read {} lines -> {}",
            report.iteration,
            report.lines,
            if report.hit() { "HIT" } else { "MISS" }
        );
    }

    fn on_message(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_complete(&self, result: &RunResult) {
        log::info!(
            "Run finished after {} iterations (hit={})",
            result.iterations,
            result.hit
        );
    }
}
