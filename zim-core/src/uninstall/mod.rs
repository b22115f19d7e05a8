// zim-core/src/uninstall/mod.rs

pub(crate) mod common;
pub mod engine;

use std::path::PathBuf;

pub use engine::{find_additional_files, UninstallSession, UninstallationEngine};

/// What an uninstall pass did. Partial deletion is still a success; whatever
/// could not be removed is listed in `files_remaining`.
#[derive(Debug, Clone, Default)]
pub struct UninstallReport {
    pub name: String,
    pub files_deleted: usize,
    pub files_remaining: Vec<PathBuf>,
    /// Files found on disk that the installer never wrote.
    pub additional_files: Vec<String>,
    pub deferred_scheduled: bool,
    pub warnings: Vec<String>,
}

impl UninstallReport {
    pub fn is_clean(&self) -> bool {
        self.files_remaining.is_empty() && self.warnings.is_empty()
    }
}
