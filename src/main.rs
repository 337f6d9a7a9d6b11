use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use cli::progress::ConsoleProgress;
use modroll::catalog::{Catalog, split_area_mods};
use modroll::config::Config;
use modroll::matching::extract;
use modroll::runner::{AutomationLoop, CommandAction, ConfiguredSource, FileLogSink, Launcher};

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("modroll")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("modroll.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Catalog { search } => handle_catalog_command(search.as_deref(), config),
        Commands::Split {
            input,
            area,
            non_area,
        } => handle_split_command(input, area, non_area),
        Commands::Check { file } => handle_check_command(file.as_deref(), config),
        Commands::Run => handle_run_command(cli, config).await,
    }
}

fn load_catalog(config: &Config) -> Catalog {
    let catalog = config.catalog.load();
    if catalog.is_empty() {
        println!(
            "{} no modifiers loaded from {}",
            "Warning:".yellow(),
            config.catalog.path.display()
        );
    }
    catalog
}

fn handle_catalog_command(search: Option<&str>, config: &Config) -> Result<()> {
    info!("Listing catalog (search: {:?})", search);
    let catalog = load_catalog(config);
    let entries = catalog.search(search.unwrap_or(""));
    for (index, modifier) in &entries {
        println!("{:>5}  {}", index.to_string().cyan(), modifier.description());
    }
    println!("{} of {} modifiers", entries.len(), catalog.len());
    Ok(())
}

fn handle_split_command(input: &Path, area: &Path, non_area: &Path) -> Result<()> {
    info!("Splitting {} into area / non-area files", input.display());
    let summary = split_area_mods(input, area, non_area)
        .with_context(|| format!("Failed to split {}", input.display()))?;

    for line in &summary.invalid_lines {
        println!("{} line {} is not valid JSON, skipped", "Warning:".yellow(), line);
    }
    println!("{} {} -> {}", "Area mods:".green(), summary.area, area.display());
    println!("{} {} -> {}", "Non-area mods:".green(), summary.non_area, non_area.display());
    Ok(())
}

fn handle_check_command(file: Option<&Path>, config: &Config) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let catalog = load_catalog(config);
    let plan = config.run.plan(&catalog).context("Invalid run configuration")?;
    let lines = extract(&text);
    let evaluation = plan.evaluator().evaluate(&lines);
    info!("Checked {} lines: hit={}", lines.len(), evaluation.hit);

    println!("Read {} modifier lines", lines.len());
    for line in &lines {
        println!("  {}", line.dimmed());
    }
    for detail in evaluation.details() {
        println!("  {} {}", "matched".green(), detail);
    }
    let verdict = if evaluation.hit {
        "HIT".green().bold()
    } else {
        "MISS".red().bold()
    };
    println!(
        "{} ({} of {} targets, rule: {})",
        verdict,
        evaluation.satisfied,
        plan.targets().len(),
        plan.rule()
    );
    Ok(())
}

async fn handle_run_command(cli: &Cli, config: &Config) -> Result<()> {
    let catalog = load_catalog(config);
    let plan = config.run.plan(&catalog).context("Invalid run configuration")?;

    let action = CommandAction::from_config(&config.action)
        .context("Invalid action configuration")?
        .ok_or_else(|| eyre!("action.command is required to run"))?;
    let source = ConfiguredSource::from_config(&config.source).context("Invalid source configuration")?;
    let roll_log = FileLogSink::open(&config.roll_log)
        .with_context(|| format!("Failed to open roll log {}", config.roll_log.display()))?;

    let runner = Arc::new(AutomationLoop::new(
        Arc::new(action),
        Arc::new(source),
        Arc::new(roll_log),
        Arc::new(ConsoleProgress::new(cli.is_verbose())),
    ));

    let launcher = Launcher::new();
    let handle = launcher.start(runner, plan).context("Failed to start automation loop")?;
    println!("{}", "Rolling... press Ctrl-C to stop".cyan());

    let ctx = handle.context();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, cancelling run");
            ctx.cancel();
        }
    });

    let result = handle.wait().await.context("Automation loop failed")?;
    info!("Run complete: {:?}", result);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
