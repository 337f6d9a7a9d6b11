//! Terminal progress output for the `run` command.

use colored::*;
use log::info;

use modroll::runner::{IterationReport, ProgressSink, RunResult};

/// Prints one line per iteration and the final summary.
pub struct ConsoleProgress {
    verbose: bool,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_iteration(&self, report: &IterationReport) {
        let verdict = if report.hit() { "HIT".green().bold() } else { "MISS".red() };
        let mut line = format!("[{}] read {} lines -> {}", report.iteration, report.lines, verdict);
        if report.hit() {
            line.push_str(&format!(" | {}", report.evaluation.details().join(", ")));
        }
        if let Some(error) = &report.error {
            line.push_str(&format!(" | {}", error.yellow()));
        } else if self.verbose && !report.hit() && report.evaluation.satisfied > 0 {
            line.push_str(&format!(" ({} partial)", report.evaluation.satisfied));
        }
        println!("{}", line);
    }

    fn on_message(&self, message: &str) {
        info!("{}", message);
        println!("{}", message.cyan());
    }

    fn on_complete(&self, result: &RunResult) {
        let status = if result.hit {
            "Target hit".green().bold()
        } else {
            "Stopped".yellow().bold()
        };
        println!(
            "{} after {} rolls ({:.2}s)",
            status,
            result.iterations,
            result.elapsed.as_secs_f64()
        );
        for detail in &result.details {
            println!("  {}", detail.green());
        }
    }
}
