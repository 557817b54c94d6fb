//! CLI output formatting utilities.

use crate::orchestrator::BatchReport;
use console::style;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print the per-song summary of a batch.
    pub fn report(report: &BatchReport) {
        if report.is_empty() {
            Output::warning("Nothing was processed.");
            return;
        }

        Output::header("Summary");
        for song in &report.songs {
            match song.outcome.path() {
                Some(path) => println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(&song.query).bold(),
                    style(path.display()).dim()
                ),
                None => println!(
                    "  {} {} {}",
                    style("✗").red(),
                    style(&song.query).bold(),
                    style(format!("({})", song.outcome.reason())).dim()
                ),
            }
        }
        println!();

        let downloaded = report.downloaded().len();
        let skipped = report.skipped().len();
        if skipped == 0 {
            Output::success(&format!("Downloaded {} of {} songs", downloaded, report.len()));
        } else {
            Output::warning(&format!(
                "Downloaded {} of {} songs, {} skipped",
                downloaded,
                report.len(),
                skipped
            ));
        }
    }
}
