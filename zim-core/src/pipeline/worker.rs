// zim-core/src/pipeline/worker.rs
//! Runs one install or uninstall job on a dedicated thread, streaming its
//! events to the front end in order.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, instrument};
use zim_common::config::{Config, TOOL_NAME};
use zim_common::error::{Result, ZimError};
use zim_common::pipeline::{JobAction, PipelineEvent};

use crate::install::{InstallOutcome, InstallRequest, InstallationEngine};
use crate::integration::{DeferredDeleter, SystemIntegration};
use crate::progress::ProgressReporter;
use crate::self_install::SelfInstallCoordinator;
use crate::uninstall::{UninstallReport, UninstallSession, UninstallationEngine};
use crate::version_store::VersionStore;

#[derive(Debug, Clone)]
pub enum WorkerJob {
    Install(InstallRequest),
    Uninstall {
        install_dir: PathBuf,
        delete_additional: bool,
    },
    SelfInstall,
    SelfUpdate {
        from_version: String,
        to_version: String,
    },
    SelfUninstall,
}

impl WorkerJob {
    pub fn action(&self) -> JobAction {
        match self {
            WorkerJob::Install(_) => JobAction::Install,
            WorkerJob::Uninstall {
                delete_additional, ..
            } => JobAction::Uninstall {
                delete_additional: *delete_additional,
            },
            WorkerJob::SelfInstall => JobAction::SelfInstall,
            WorkerJob::SelfUpdate {
                from_version,
                to_version,
            } => JobAction::SelfUpdate {
                from_version: from_version.clone(),
                to_version: to_version.clone(),
            },
            WorkerJob::SelfUninstall => JobAction::SelfUninstall,
        }
    }

    pub fn target_id(&self) -> String {
        match self {
            WorkerJob::Install(request) => request.skeleton.name.clone(),
            WorkerJob::Uninstall { install_dir, .. } => install_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| install_dir.display().to_string()),
            WorkerJob::SelfInstall | WorkerJob::SelfUpdate { .. } | WorkerJob::SelfUninstall => {
                TOOL_NAME.to_string()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Installed(InstallOutcome),
    Uninstalled(UninstallReport),
}

impl JobOutcome {
    pub fn warnings(&self) -> &[String] {
        match self {
            JobOutcome::Installed(outcome) => &outcome.warnings,
            JobOutcome::Uninstalled(report) => &report.warnings,
        }
    }
}

/// Shared collaborators handed to the worker thread.
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Config,
    pub integration: Arc<dyn SystemIntegration>,
    pub deleter: Arc<dyn DeferredDeleter>,
    pub versions: Arc<dyn VersionStore>,
    /// Overrides the binary treated as running; `None` uses the current executable.
    pub running_executable: Option<PathBuf>,
}

/// Starts `job` on its own thread. Every event, including the final
/// `JobSuccess`/`JobFailed`, is sent on `event_tx` before the thread returns.
pub fn spawn_job(
    job: WorkerJob,
    context: WorkerContext,
    event_tx: UnboundedSender<PipelineEvent>,
) -> JoinHandle<Result<JobOutcome>> {
    thread::spawn(move || {
        let target_id = job.target_id();
        let action = job.action();
        let _ = event_tx.send(PipelineEvent::JobStarted {
            target_id: target_id.clone(),
            action: action.clone(),
        });
        let reporter = ProgressReporter::new(target_id.clone(), event_tx.clone());

        let result = execute_job(job, &context, &reporter);
        match &result {
            Ok(outcome) => {
                let install_path = match outcome {
                    JobOutcome::Installed(o) => o.install_path().to_path_buf(),
                    JobOutcome::Uninstalled(_) => PathBuf::new(),
                };
                debug!("[{}] Job finished", target_id);
                let _ = event_tx.send(PipelineEvent::JobSuccess {
                    target_id,
                    action,
                    install_path,
                });
            }
            Err(e) => {
                error!("[{}] Job failed: {}", target_id, e);
                let _ = event_tx.send(PipelineEvent::job_failed(target_id, action, e));
            }
        }
        result
    })
}

#[instrument(skip_all, fields(target_id = %reporter.target_id()))]
fn execute_job(job: WorkerJob, context: &WorkerContext, reporter: &ProgressReporter) -> Result<JobOutcome> {
    let running = context
        .running_executable
        .clone()
        .or_else(|| std::env::current_exe().ok());
    let removing = matches!(job, WorkerJob::SelfUninstall);
    match job {
        WorkerJob::Install(request) => {
            let engine = InstallationEngine::new(context.integration.as_ref())
                .with_running_executable(running);
            engine.install(&request, reporter).map(JobOutcome::Installed)
        }
        WorkerJob::Uninstall {
            install_dir,
            delete_additional,
        } => {
            let session = UninstallSession::open(&install_dir)?;
            let engine =
                UninstallationEngine::new(context.integration.as_ref(), context.deleter.as_ref())
                    .with_running_executable(running);
            engine
                .uninstall(&session, delete_additional, reporter)
                .map(JobOutcome::Uninstalled)
        }
        WorkerJob::SelfInstall | WorkerJob::SelfUpdate { .. } | WorkerJob::SelfUninstall => {
            let running = running.ok_or_else(|| {
                ZimError::NotFound("path of the running executable".to_string())
            })?;
            let coordinator = SelfInstallCoordinator::new(
                &context.config,
                context.integration.as_ref(),
                context.deleter.as_ref(),
                context.versions.as_ref(),
            )?
            .with_running_executable(running);
            if removing {
                coordinator.uninstall_self(reporter).map(JobOutcome::Uninstalled)
            } else {
                coordinator.install_self(reporter).map(JobOutcome::Installed)
            }
        }
    }
}
