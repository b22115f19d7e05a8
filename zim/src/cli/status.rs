// zim/src/cli/status.rs
//! Renders the worker's event stream as a progress bar and drives a job to
//! completion from async code.

use std::path::PathBuf;

use colored::Colorize;
use indicatif::ProgressBar;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;
use zim_common::error::{Result, ZimError};
use zim_common::pipeline::PipelineEvent;
use zim_core::pipeline::{spawn_job, JobOutcome, WorkerContext, WorkerJob};

use crate::cli::ui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded { install_path: PathBuf },
    Failed { error: String },
}

/// What the front end knows about a job, built only from its events.
#[derive(Debug, Clone)]
pub struct JobView {
    pub target_id: String,
    pub percent: u8,
    pub message: String,
    pub warnings: Vec<String>,
    pub removal_failures: Vec<(PathBuf, String)>,
    pub state: JobState,
}

impl JobView {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            percent: 0,
            message: String::new(),
            warnings: Vec::new(),
            removal_failures: Vec::new(),
            state: JobState::Pending,
        }
    }

    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::JobStarted { .. } => self.state = JobState::Running,
            PipelineEvent::Progress { percent, .. } => {
                self.percent = self.percent.max((*percent).min(100));
            }
            PipelineEvent::Status { message, .. } => self.message = message.clone(),
            PipelineEvent::FileRemovalFailed { path, error, .. } => {
                self.removal_failures.push((path.clone(), error.clone()));
            }
            PipelineEvent::Warning { message, .. } => self.warnings.push(message.clone()),
            PipelineEvent::JobSuccess { install_path, .. } => {
                self.state = JobState::Succeeded {
                    install_path: install_path.clone(),
                };
            }
            PipelineEvent::JobFailed { error, .. } => {
                self.state = JobState::Failed {
                    error: error.clone(),
                };
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            JobState::Succeeded { .. } | JobState::Failed { .. }
        )
    }
}

/// Consumes events until the worker drops its sender, keeping `bar` in step.
pub async fn handle_events(
    mut rx: UnboundedReceiver<PipelineEvent>,
    target_id: String,
    bar: ProgressBar,
) -> JobView {
    let mut view = JobView::new(target_id);
    while let Some(event) = rx.recv().await {
        view.apply(&event);
        match &event {
            PipelineEvent::Progress { .. } => bar.set_position(u64::from(view.percent)),
            PipelineEvent::Status { message, .. } => bar.set_message(message.clone()),
            PipelineEvent::Warning { message, .. } => {
                bar.println(format!("{} {}", "Warning:".yellow().bold(), message));
            }
            PipelineEvent::FileRemovalFailed { path, error, .. } => {
                bar.println(format!(
                    "{} could not remove {}: {}",
                    "Warning:".yellow().bold(),
                    path.display(),
                    error
                ));
            }
            PipelineEvent::JobSuccess { .. } => {
                bar.set_position(100);
                bar.finish_with_message(view.message.clone());
            }
            PipelineEvent::JobFailed { error, .. } => {
                bar.abandon_with_message(format!("{}", error.as_str().red()));
            }
            PipelineEvent::JobStarted { action, .. } => {
                debug!("[{}] Started {:?}", view.target_id, action);
            }
        }
    }
    if !view.is_finished() {
        bar.abandon();
    }
    view
}

/// Runs `job` on a worker thread and renders its progress until it ends.
pub async fn run_job(job: WorkerJob, context: WorkerContext) -> Result<JobOutcome> {
    let target_id = job.target_id();
    let bar = ui::create_job_bar(&target_id);
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = spawn_job(job, context, tx);
    let status = tokio::spawn(handle_events(rx, target_id, bar));

    let joined = tokio::task::spawn_blocking(move || handle.join())
        .await
        .map_err(|e| ZimError::Generic(format!("Worker task failed: {e}")))?;
    let view = status
        .await
        .map_err(|e| ZimError::Generic(format!("Status display failed: {e}")))?;
    debug!("[{}] Final state {:?}", view.target_id, view.state);

    joined.map_err(|_| ZimError::Generic("Worker thread panicked".to_string()))?
}
