// zim-core/src/integration/mod.rs
//! Narrow interfaces to the host: shortcuts, the uninstall registry and the
//! post-exit removal of a running executable. The engines treat every
//! failure here as a warning.

use std::path::{Path, PathBuf};

use zim_common::error::Result;
use zim_common::model::{InstallManifest, InstalledVersion};

pub mod deferred;
pub mod local;

pub use deferred::ScriptDeleter;
pub use local::LocalIntegration;

pub trait SystemIntegration: Send + Sync {
    /// Creates (or replaces) a shortcut at `link_path` launching `target`.
    /// Returns `false` when the shortcut could not be written.
    fn create_shortcut(&self, target: &Path, link_path: &Path, working_dir: &Path, icon: &str) -> bool;

    /// Removes a shortcut. An absent shortcut counts as removed.
    fn remove_shortcut(&self, link_path: &Path) -> bool;

    fn desktop_shortcut_path(&self, name: &str) -> PathBuf;

    fn start_menu_shortcut_path(&self, name: &str) -> PathBuf;

    fn register_uninstall_entry(&self, manifest: &InstallManifest) -> Result<()>;

    fn unregister_uninstall_entry(&self, identity: &str) -> Result<()>;

    fn query_installed_version(&self, identity: &str) -> InstalledVersion;
}

/// Removes files that cannot be deleted while this process is alive.
pub trait DeferredDeleter: Send + Sync {
    /// Arranges for `executable` (and `directory`, recursively, if given) to be
    /// removed after the current process exits. Returns once scheduled.
    fn schedule_deletion(&self, executable: &Path, directory: Option<&Path>) -> Result<()>;
}
