// zim/src/cli/uninstall.rs
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use tracing::debug;
use zim_common::config::{Config, MANIFEST_FILENAME};
use zim_common::error::{Result, ZimError};
use zim_core::pipeline::{JobOutcome, WorkerJob};
use zim_core::{LocalIntegration, SystemIntegration, UninstallSession};

use crate::cli::{status, ui, worker_context};

/// Number of additional file names shown before asking about them.
const SAMPLE_SIZE: usize = 5;

#[derive(Args, Debug)]
pub struct Uninstall {
    /// Install directory or registered application name (defaults to the
    /// directory of the running executable)
    pub target: Option<PathBuf>,

    /// Also delete files that were not installed by zim
    #[arg(long, conflicts_with = "keep_additional")]
    pub delete_additional: bool,

    /// Leave files that were not installed by zim in place
    #[arg(long)]
    pub keep_additional: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl Uninstall {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let running = std::env::current_exe().ok();
        let install_dir = resolve_install_dir(self.target.as_deref(), running.as_deref(), config)?;
        let session = UninstallSession::open(&install_dir)?;
        let name = session.manifest().product_name.clone();

        println!(
            "{} Uninstalling {} from {}",
            "==>".blue().bold(),
            name.bold(),
            install_dir.display()
        );
        if !self.yes && !ui::confirm(&format!("Remove {name}?"), false)? {
            println!("Uninstall cancelled.");
            return Ok(());
        }
        let delete_additional = self.decide_additional(&session)?;
        debug!("Uninstall {} delete_additional={}", name, delete_additional);

        let job = WorkerJob::Uninstall {
            install_dir,
            delete_additional,
        };
        let outcome = status::run_job(job, worker_context(config, running)).await?;
        if let JobOutcome::Uninstalled(report) = &outcome {
            if report.is_clean() {
                println!(
                    "{} {} removed ({} files)",
                    "==>".green().bold(),
                    report.name.bold(),
                    report.files_deleted
                );
            } else {
                println!(
                    "{} {} removed with {} file(s) left behind",
                    "==>".yellow().bold(),
                    report.name.bold(),
                    report.files_remaining.len()
                );
                for path in &report.files_remaining {
                    println!("  - {}", path.display());
                }
            }
        }
        ui::print_warnings(outcome.warnings());
        Ok(())
    }

    /// Explicit flags win; an install without extra files removes everything;
    /// otherwise the user is asked, keeping the files when no one can answer.
    fn decide_additional(&self, session: &UninstallSession) -> Result<bool> {
        if self.delete_additional {
            return Ok(true);
        }
        if self.keep_additional {
            return Ok(false);
        }
        if !session.has_additional_files() {
            return Ok(true);
        }
        if self.yes {
            return Ok(false);
        }

        let additional = session.additional_files();
        println!(
            "{} file(s) in {} were not installed by zim:",
            additional.len(),
            session.install_dir().display()
        );
        for file in session.additional_sample(SAMPLE_SIZE) {
            println!("  {file}");
        }
        if additional.len() > SAMPLE_SIZE {
            println!("  ... and {} more", additional.len() - SAMPLE_SIZE);
        }
        ui::confirm("Delete these files too?", false)
    }
}

/// Maps the user's target to an install directory: a directory holding a
/// manifest, then a registered application name, then the directory of the
/// running executable when no target was given.
pub fn resolve_install_dir(
    target: Option<&Path>,
    running: Option<&Path>,
    config: &Config,
) -> Result<PathBuf> {
    let Some(target) = target else {
        return running
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or_else(|| ZimError::NotFound("directory of the running executable".to_string()));
    };
    if target.join(MANIFEST_FILENAME).is_file() {
        return Ok(target.to_path_buf());
    }

    let name = target.to_string_lossy();
    let installed = LocalIntegration::new(config).query_installed_version(&name);
    match installed.path {
        Some(path) if installed.installed => {
            debug!("Resolved {} to {}", name, path.display());
            Ok(path)
        }
        _ if target.is_dir() => Ok(target.to_path_buf()),
        _ => Err(ZimError::NotFound(format!("installed application '{name}'"))),
    }
}
