// zim-common/src/model/mod.rs
pub mod inspection;
pub mod integration;
pub mod manifest;
pub mod version;

// Re-export
pub use inspection::ArchiveInspectionResult;
pub use integration::{InstalledVersion, UninstallEntry};
pub use manifest::{InstallManifest, ManifestSkeleton};
pub use version::{VersionComparison, VersionTuple};
