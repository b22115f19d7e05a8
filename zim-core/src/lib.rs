// zim-core/src/lib.rs

pub mod inspect;
pub mod install;
pub mod integration;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod self_install;
pub mod uninstall;
pub mod version_store;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export key types for easier use by the CLI crate
pub use inspect::{inspect_archive, inspect_entries};
pub use install::{InstallOutcome, InstallRequest, InstallationEngine};
pub use integration::{DeferredDeleter, LocalIntegration, ScriptDeleter, SystemIntegration};
pub use metadata::{ExecutableMetadata, NoMetadata};
pub use planner::{plan_install, InstallPlan};
pub use progress::ProgressReporter;
pub use self_install::{SelfInstallCoordinator, SelfInstallOffer, SelfInstallStatus};
pub use uninstall::{UninstallReport, UninstallSession, UninstallationEngine};
pub use version_store::{JsonVersionStore, StaticVersionStore, VersionStore};
