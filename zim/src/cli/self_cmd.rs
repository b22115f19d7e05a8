// zim/src/cli/self_cmd.rs
use clap::{Args, Subcommand};
use colored::Colorize;
use zim_common::config::{Config, TOOL_NAME};
use zim_common::error::{Result, ZimError};
use zim_core::pipeline::{JobOutcome, WorkerContext, WorkerJob};
use zim_core::{SelfInstallCoordinator, SelfInstallOffer, SelfInstallStatus};

use crate::cli::{status, ui, worker_context};

#[derive(Subcommand, Debug)]
pub enum SelfCommand {
    /// Show whether zim is installed and what can be done about it
    Status,
    /// Install the running binary into the programs directory
    Install(SelfArgs),
    /// Replace the installed copy with the running, newer binary
    Update(SelfArgs),
    /// Remove the installed copy
    Uninstall(SelfArgs),
}

#[derive(Args, Debug)]
pub struct SelfArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl SelfCommand {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let context = worker_context(config, None);
        let current = self_status(&context)?;
        match self {
            SelfCommand::Status => {
                print_status(&current);
                Ok(())
            }
            SelfCommand::Install(args) => {
                select_offer(&current, |o| matches!(o, SelfInstallOffer::Install))?;
                run_offer(WorkerJob::SelfInstall, &SelfInstallOffer::Install, args.yes, true, context).await
            }
            SelfCommand::Update(args) => {
                let offer = select_offer(&current, |o| matches!(o, SelfInstallOffer::Update { .. }))?;
                let SelfInstallOffer::Update { from, to } = offer.clone() else {
                    return Err(ZimError::Generic("No update available".to_string()));
                };
                let job = WorkerJob::SelfUpdate {
                    from_version: from,
                    to_version: to,
                };
                run_offer(job, &offer, args.yes, true, context).await
            }
            SelfCommand::Uninstall(args) => {
                select_offer(&current, |o| matches!(o, SelfInstallOffer::Uninstall))?;
                run_offer(WorkerJob::SelfUninstall, &SelfInstallOffer::Uninstall, args.yes, false, context)
                    .await
            }
        }
    }
}

fn self_status(context: &WorkerContext) -> Result<SelfInstallStatus> {
    let mut coordinator = SelfInstallCoordinator::new(
        &context.config,
        context.integration.as_ref(),
        context.deleter.as_ref(),
        context.versions.as_ref(),
    )?;
    if let Some(running) = &context.running_executable {
        coordinator = coordinator.with_running_executable(running.clone());
    }
    coordinator.status()
}

/// Finds the offer `wanted` accepts, or explains why it is not available.
fn select_offer(
    current: &SelfInstallStatus,
    wanted: impl Fn(&SelfInstallOffer) -> bool,
) -> Result<SelfInstallOffer> {
    if let Some(offer) = current.offers.iter().find(|&o| wanted(o)) {
        return Ok(offer.clone());
    }
    let reason = match (&current.installed.version, current.installed.installed) {
        (_, false) => format!("{TOOL_NAME} is not installed"),
        (Some(version), true) => format!(
            "{TOOL_NAME} {version} is installed and the running version is {}",
            current.running_version
        ),
        (None, true) => format!("{TOOL_NAME} is already installed"),
    };
    let options = current
        .offers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ZimError::Generic(format!("{reason}; available: {options}")))
}

async fn run_offer(
    job: WorkerJob,
    offer: &SelfInstallOffer,
    yes: bool,
    default: bool,
    context: WorkerContext,
) -> Result<()> {
    if !yes && !ui::confirm(&format!("{offer}?"), default)? {
        println!("Cancelled.");
        return Ok(());
    }
    let outcome = status::run_job(job, context).await?;
    match &outcome {
        JobOutcome::Installed(installed) => println!(
            "{} {} {} installed in {}",
            "==>".green().bold(),
            TOOL_NAME.bold(),
            installed.manifest.version,
            installed.install_path().display()
        ),
        JobOutcome::Uninstalled(report) if report.deferred_scheduled => println!(
            "{} {} will be removed once this process exits",
            "==>".green().bold(),
            TOOL_NAME.bold()
        ),
        JobOutcome::Uninstalled(report) => {
            println!("{} {} removed", "==>".green().bold(), TOOL_NAME.bold());
            for path in &report.files_remaining {
                println!("  {} {}", "not removed:".yellow(), path.display());
            }
        }
    }
    ui::print_warnings(outcome.warnings());
    Ok(())
}

fn print_status(current: &SelfInstallStatus) {
    println!("Running version:  {}", current.running_version);
    match (&current.installed.version, &current.installed.path) {
        (Some(version), Some(path)) if current.installed.installed => {
            println!("Installed:        {} at {}", version, path.display());
        }
        _ => println!("Installed:        {}", "no".yellow()),
    }
    if current.running_from_install {
        println!("{}", "Running from the installed copy".dimmed());
    }
    println!("Available actions:");
    for offer in &current.offers {
        println!("  - {offer}");
    }
}
