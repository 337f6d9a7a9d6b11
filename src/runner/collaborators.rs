//! External collaborators of the automation loop.
//!
//! `ItemAction` performs one scripted input cycle; `TextSource` reads the
//! current item description. The shell-backed implementations let the CLI
//! delegate both to user-supplied commands.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::config::{ActionConfig, SourceConfig, Workflow};
use crate::error::{Result, RollError};

/// Performs one scripted input cycle on the item.
#[async_trait]
pub trait ItemAction: Send + Sync {
    async fn perform(&self, iteration: u64) -> Result<()>;
}

/// Produces a point-in-time snapshot of the item description text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn snapshot(&self) -> Result<String>;
}

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd
}

fn failure_message(command: &str, output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut message = format!("'{}' exited with {:?}", command, output.status.code());
    if !stderr.trim().is_empty() {
        message.push_str(&format!(": {}", stderr.trim()));
    }
    message
}

/// Runs a shell command for each input cycle, then waits for the game to settle.
///
/// The command sees `MODROLL_ITERATION`, `MODROLL_OFFSET`, and `MODROLL_WORKFLOW`.
#[derive(Debug, Clone)]
pub struct CommandAction {
    command: String,
    offset: u32,
    workflow: Workflow,
    settle: Duration,
}

impl CommandAction {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            offset: 0,
            workflow: Workflow::Single,
            settle: Duration::ZERO,
        }
    }

    /// Build from action configuration. Returns `None` when no command is set.
    pub fn from_config(config: &ActionConfig) -> Result<Option<Self>> {
        let Some(command) = &config.command else {
            return Ok(None);
        };
        Ok(Some(Self {
            command: command.clone(),
            offset: config.offset,
            workflow: config.workflow,
            settle: config.settle_delay()?,
        }))
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }
}

#[async_trait]
impl ItemAction for CommandAction {
    async fn perform(&self, iteration: u64) -> Result<()> {
        let mut cmd = shell(&self.command);
        cmd.env("MODROLL_ITERATION", iteration.to_string())
            .env("MODROLL_OFFSET", self.offset.to_string())
            .env("MODROLL_WORKFLOW", self.workflow.to_string());

        let output = cmd
            .output()
            .await
            .map_err(|e| RollError::Action(format!("'{}': {}", self.command, e)))?;
        if !output.status.success() {
            return Err(RollError::Action(failure_message(&self.command, &output)));
        }

        debug!("Action #{} done, settling {:?}", iteration, self.settle);
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }
}

/// Snapshot taken from a shell command's stdout (e.g. a clipboard reader).
#[derive(Debug, Clone)]
pub struct CommandSource {
    command: String,
}

impl CommandSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl TextSource for CommandSource {
    async fn snapshot(&self) -> Result<String> {
        let output = shell(&self.command)
            .output()
            .await
            .map_err(|e| RollError::Snapshot(format!("'{}': {}", self.command, e)))?;
        if !output.status.success() {
            return Err(RollError::Snapshot(failure_message(&self.command, &output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Snapshot read from a file on every iteration.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl TextSource for FileSource {
    async fn snapshot(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RollError::Snapshot(format!("{}: {}", self.path.display(), e)))
    }
}

/// Either kind of snapshot source, chosen from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Command(CommandSource),
    File(FileSource),
}

impl ConfiguredSource {
    /// Pick the source named in configuration; exactly one must be set.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        match (&config.command, &config.file) {
            (Some(command), None) => Ok(Self::Command(CommandSource::new(command.clone()))),
            (None, Some(file)) => Ok(Self::File(FileSource::new(file))),
            (Some(_), Some(_)) => Err(RollError::Config(
                "source.command and source.file are mutually exclusive".into(),
            )),
            (None, None) => Err(RollError::Config(
                "either source.command or source.file is required".into(),
            )),
        }
    }
}

#[async_trait]
impl TextSource for ConfiguredSource {
    async fn snapshot(&self) -> Result<String> {
        match self {
            ConfiguredSource::Command(source) => source.snapshot().await,
            ConfiguredSource::File(source) => source.snapshot().await,
        }
    }
}
