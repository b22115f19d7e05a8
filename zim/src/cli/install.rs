// zim/src/cli/install.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use tracing::debug;
use zim_common::config::Config;
use zim_common::error::{Result, ZimError};
use zim_core::pipeline::{JobOutcome, WorkerJob};
use zim_core::{inspect_archive, plan_install, InstallPlan, NoMetadata};

use crate::cli::{status, ui, worker_context};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// ZIP archive containing the application
    pub archive: PathBuf,

    /// Display name (defaults to the executable's product name or file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Executable inside the archive to launch and register
    #[arg(long = "exe", value_name = "FILE")]
    pub executable: Option<String>,

    /// Version recorded in the manifest
    #[arg(long = "version", value_name = "VERSION")]
    pub app_version: Option<String>,

    /// Install directory (defaults to <programs dir>/<name>)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Create a desktop shortcut
    #[arg(long)]
    pub desktop: bool,

    /// Create a start menu shortcut
    #[arg(long = "start-menu")]
    pub start_menu: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl InstallArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let spinner = ui::create_spinner(&format!("Reading {}", self.archive.display()));
        let planned = inspect_archive(&self.archive)
            .and_then(|inspection| plan_install(&self.archive, &inspection, &NoMetadata, config));
        spinner.finish_and_clear();
        let mut plan = planned?;

        self.apply_overrides(&mut plan, config);
        debug!("Install plan: {:?}", plan);
        if !plan.is_ready() {
            return Err(ZimError::InstallError(format!(
                "No executable found in {}; choose one with --exe",
                self.archive.display()
            )));
        }

        print_plan(&plan);
        if !self.yes && !ui::confirm("Proceed with installation?", true)? {
            println!("Installation cancelled.");
            return Ok(());
        }

        let request = plan.into_request(self.desktop, self.start_menu);
        let outcome = status::run_job(WorkerJob::Install(request), worker_context(config, None)).await?;
        if let JobOutcome::Installed(installed) = &outcome {
            println!(
                "{} Installed {} {} into {}",
                "==>".green().bold(),
                installed.manifest.product_name.bold(),
                installed.manifest.version,
                installed.install_path().display()
            );
        }
        ui::print_warnings(outcome.warnings());
        Ok(())
    }

    fn apply_overrides(&self, plan: &mut InstallPlan, config: &Config) {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            plan.rename(name, config);
        }
        if let Some(exe) = &self.executable {
            plan.executable = exe.clone();
        }
        if let Some(version) = &self.app_version {
            plan.version = version.clone();
        }
        if let Some(dir) = &self.dir {
            plan.install_path = dir.clone();
        }
    }
}

fn print_plan(plan: &InstallPlan) {
    println!("{} {}", "==>".blue().bold(), plan.name.bold());
    println!("  Executable:  {}", plan.executable);
    println!("  Version:     {}", plan.version);
    println!("  Publisher:   {}", plan.publisher);
    println!("  Install to:  {}", plan.install_path.display());
}
