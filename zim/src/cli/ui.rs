// zim/src/cli/ui.rs
//! Spinners, progress bars and prompts shared by the commands.

use std::time::Duration;

use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use zim_common::error::{Result, ZimError};

/// Creates a spinner with a steady tick for work without a known length.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A 0-100 bar driven by job progress events.
pub fn create_job_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(prefix.to_string());
    pb
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| ZimError::Generic(format!("Could not read confirmation: {e}")))
}

/// Prints the non-fatal problems a job collected, after its progress bar.
pub fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!(
        "{} Completed with {} warning(s):",
        "Warning:".yellow().bold(),
        warnings.len()
    );
    for warning in warnings {
        println!("  - {warning}");
    }
}
