// zim-common/src/pipeline.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ZimError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobAction {
    Install,
    Uninstall { delete_additional: bool },
    SelfInstall,
    SelfUpdate { from_version: String, to_version: String },
    SelfUninstall,
}

/// Ordered notifications from the worker to whatever renders progress.
/// Receivers must apply them in the order they arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    JobStarted {
        target_id: String,
        action: JobAction,
    },
    /// Overall completion, 0-100, never lower than a previous value for the same job.
    Progress {
        target_id: String,
        percent: u8,
    },
    Status {
        target_id: String,
        message: String,
    },
    FileRemovalFailed {
        target_id: String,
        path: PathBuf,
        error: String,
    },
    /// A non-fatal problem; the job carries on.
    Warning {
        target_id: String,
        message: String,
    },
    JobSuccess {
        target_id: String,
        action: JobAction,
        install_path: PathBuf,
    },
    JobFailed {
        target_id: String,
        action: JobAction,
        error: String, // Keep as String
    },
}

impl PipelineEvent {
    pub fn job_failed(target_id: String, action: JobAction, error: &ZimError) -> Self {
        PipelineEvent::JobFailed {
            target_id,
            action,
            error: error.to_string(),
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            PipelineEvent::JobStarted { target_id, .. }
            | PipelineEvent::Progress { target_id, .. }
            | PipelineEvent::Status { target_id, .. }
            | PipelineEvent::FileRemovalFailed { target_id, .. }
            | PipelineEvent::Warning { target_id, .. }
            | PipelineEvent::JobSuccess { target_id, .. }
            | PipelineEvent::JobFailed { target_id, .. } => target_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::JobSuccess { .. } | PipelineEvent::JobFailed { .. }
        )
    }
}
