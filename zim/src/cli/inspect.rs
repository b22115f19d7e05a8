// zim/src/cli/inspect.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use zim_common::config::Config;
use zim_common::error::Result;
use zim_core::{inspect_archive, plan_install, NoMetadata};

use crate::cli::ui;

#[derive(Args, Debug)]
pub struct Inspect {
    /// ZIP archive to examine
    pub archive: PathBuf,
}

impl Inspect {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let spinner = ui::create_spinner(&format!("Inspecting {}", self.archive.display()));
        let inspection = inspect_archive(&self.archive);
        spinner.finish_and_clear();
        let inspection = inspection?;

        println!(
            "{} {}",
            "==>".blue().bold(),
            self.archive.display().to_string().bold()
        );
        match &inspection.extraction_root {
            Some(root) => println!("Root folder: {}", root.cyan()),
            None => println!("Root folder: {}", "(none)".dimmed()),
        }
        if inspection.executable_candidates.is_empty() {
            println!("{}", "No executable found at the archive root".yellow());
        } else {
            println!("Executables:");
            for (i, candidate) in inspection.executable_candidates.iter().enumerate() {
                let marker = if i == 0 { "*".green().bold() } else { " ".normal() };
                println!("  {marker} {candidate}");
            }
        }

        let plan = plan_install(&self.archive, &inspection, &NoMetadata, config)?;
        println!();
        println!("Name:        {}", plan.name);
        println!("Version:     {}", plan.version);
        println!("Publisher:   {}", plan.publisher);
        println!("Install to:  {}", plan.install_path.display());
        Ok(())
    }
}
