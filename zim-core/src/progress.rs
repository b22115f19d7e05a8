// zim-core/src/progress.rs
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use zim_common::pipeline::PipelineEvent;

/// Emits the progress, status and warning events of one job.
///
/// Progress is clamped to 0-100 and never goes backwards: a value lower than
/// the last one sent is dropped. Without a sender, events only reach the log.
#[derive(Debug)]
pub struct ProgressReporter {
    target_id: String,
    event_tx: Option<UnboundedSender<PipelineEvent>>,
    last_percent: AtomicU8,
    started: AtomicBool,
}

impl ProgressReporter {
    pub fn new(target_id: impl Into<String>, event_tx: UnboundedSender<PipelineEvent>) -> Self {
        Self::build(target_id.into(), Some(event_tx))
    }

    /// A reporter that only logs.
    pub fn silent(target_id: impl Into<String>) -> Self {
        Self::build(target_id.into(), None)
    }

    fn build(target_id: String, event_tx: Option<UnboundedSender<PipelineEvent>>) -> Self {
        Self {
            target_id,
            event_tx,
            last_percent: AtomicU8::new(0),
            started: AtomicBool::new(false),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn progress(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last_percent.fetch_max(percent, Ordering::SeqCst);
        let first = !self.started.swap(true, Ordering::SeqCst);
        if percent < previous || (percent == previous && !first) {
            return;
        }
        self.send(PipelineEvent::Progress {
            target_id: self.target_id.clone(),
            percent,
        });
    }

    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("[{}] {}", self.target_id, message);
        self.send(PipelineEvent::Status {
            target_id: self.target_id.clone(),
            message,
        });
    }

    /// Reports a non-fatal problem and hands the message back for the caller's warning list.
    pub fn warn(&self, message: impl Into<String>) -> String {
        let message = message.into();
        warn!("[{}] {}", self.target_id, message);
        self.send(PipelineEvent::Warning {
            target_id: self.target_id.clone(),
            message: message.clone(),
        });
        message
    }

    pub fn file_removal_failed(&self, path: &std::path::Path, error: &str) {
        warn!(
            "[{}] Could not remove {}: {}",
            self.target_id,
            path.display(),
            error
        );
        self.send(PipelineEvent::FileRemovalFailed {
            target_id: self.target_id.clone(),
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    pub fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            // A closed receiver means nobody is rendering anymore.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{drain, progress_values};

    #[test]
    fn regressions_and_repeats_are_dropped() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ProgressReporter::new("app", tx);
        for p in [10, 30, 20, 30, 60, 250] {
            reporter.progress(p);
        }
        assert_eq!(progress_values(&drain(&mut rx)), vec![10, 30, 60, 100]);
    }

    #[test]
    fn initial_zero_is_reported_once() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ProgressReporter::new("app", tx);
        reporter.progress(0);
        reporter.progress(0);
        assert_eq!(progress_values(&drain(&mut rx)), vec![0]);
    }

    #[test]
    fn warn_returns_message_and_emits_event() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ProgressReporter::new("app", tx);
        let msg = reporter.warn("shortcut failed");
        assert_eq!(msg, "shortcut failed");
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [PipelineEvent::Warning { message, .. }] if message == "shortcut failed"
        ));
    }
}
