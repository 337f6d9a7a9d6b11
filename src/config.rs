//! Typed configuration loaded from YAML with a fallback chain.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ModFilter};
use crate::error::{Result, RollError};
use crate::matching::{Rule, TargetSpec};
use crate::runner::RunPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub catalog: CatalogConfig,
    pub run: RunConfig,
    pub action: ActionConfig,
    pub source: SourceConfig,
    /// Append-only roll log path
    pub roll_log: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            catalog: CatalogConfig::default(),
            run: RunConfig::default(),
            action: ActionConfig::default(),
            source: SourceConfig::default(),
            roll_log: PathBuf::from("roll_log.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub filter: ModFilter,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stats.ndjson"),
            filter: ModFilter::default(),
        }
    }
}

impl CatalogConfig {
    pub fn load(&self) -> Catalog {
        Catalog::load(&self.path, &self.filter)
    }
}

/// A target as written in configuration: a catalog index or ref plus bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub index: Option<usize>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TargetConfig {
    /// Resolve against the catalog, by index first, then by exact ref.
    pub fn resolve(&self, catalog: &Catalog) -> Result<TargetSpec> {
        let modifier = match (self.index, self.reference.as_deref()) {
            (Some(index), _) => catalog.get(index).ok_or_else(|| {
                RollError::Config(format!(
                    "target index {} is outside the catalog ({} modifiers)",
                    index,
                    catalog.len()
                ))
            })?,
            (None, Some(reference)) => catalog
                .find_by_ref(reference)
                .map(|(_, m)| m)
                .ok_or_else(|| RollError::Config(format!("no catalog modifier with ref '{}'", reference)))?,
            (None, None) => {
                return Err(RollError::Config("target needs an index or a ref".into()));
            }
        };

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(RollError::Config(format!(
                    "target '{}' has min {} above max {}",
                    modifier.description(),
                    min,
                    max
                )));
            }
        }

        Ok(TargetSpec {
            modifier: modifier.clone(),
            min: self.min,
            max: self.max,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    #[default]
    All,
    KOfN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub mode: RuleMode,
    /// Only used with `k_of_n`
    pub k: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            mode: RuleMode::All,
            k: 1,
        }
    }
}

impl RuleConfig {
    pub fn to_rule(&self) -> Rule {
        match self.mode {
            RuleMode::All => Rule::All,
            RuleMode::KOfN => Rule::AtLeast(self.k),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub targets: Vec<TargetConfig>,
    pub rule: RuleConfig,
    pub loop_delay_secs: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            rule: RuleConfig::default(),
            loop_delay_secs: 0.2,
        }
    }
}

impl RunConfig {
    pub fn loop_delay(&self) -> Result<Duration> {
        secs_to_duration("loop_delay_secs", self.loop_delay_secs)
    }

    pub fn resolve_targets(&self, catalog: &Catalog) -> Result<Vec<TargetSpec>> {
        self.targets.iter().map(|t| t.resolve(catalog)).collect()
    }

    /// Resolve targets and freeze everything into a run plan.
    pub fn plan(&self, catalog: &Catalog) -> Result<RunPlan> {
        RunPlan::new(
            self.resolve_targets(catalog)?,
            self.rule.to_rule(),
            self.loop_delay()?,
        )
    }
}

/// Which currency sequence the input script performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// One currency, then the item
    #[default]
    Single,
    /// Two currencies applied in turn
    Double,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workflow::Single => f.write_str("single"),
            Workflow::Double => f.write_str("double"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Shell command performing one input cycle
    pub command: Option<String>,
    /// Random pixel jitter the input script should apply
    pub offset: u32,
    pub workflow: Workflow,
    pub click_delay_secs: f64,
    pub copy_delay_secs: f64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            command: None,
            offset: 3,
            workflow: Workflow::Single,
            click_delay_secs: 0.25,
            copy_delay_secs: 0.15,
        }
    }
}

impl ActionConfig {
    /// Time to wait after the command before taking a snapshot
    pub fn settle_delay(&self) -> Result<Duration> {
        Ok(secs_to_duration("click_delay_secs", self.click_delay_secs)?
            + secs_to_duration("copy_delay_secs", self.copy_delay_secs)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Shell command whose stdout is the item text
    pub command: Option<String>,
    /// File read on every iteration
    pub file: Option<PathBuf>,
}

fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(RollError::Config(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, secs
        )));
    }
    Ok(Duration::from_micros((secs * 1_000_000.0).round() as u64))
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
