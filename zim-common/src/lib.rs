// zim-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

// Re-export key types
pub use config::Config;
pub use error::{Result, ZimError};
pub use model::{ArchiveInspectionResult, InstallManifest, ManifestSkeleton};
