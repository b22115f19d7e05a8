// zim-core/src/metadata.rs
use std::collections::HashMap;
use std::path::Path;

use zim_common::error::Result;

/// Version-resource style key/value data embedded in an executable
/// (`ProductName`, `FileVersion`, `LegalCopyright`, ...).
pub trait ExecutableMetadata: Send + Sync {
    fn lookup(&self, executable: &Path) -> Result<HashMap<String, String>>;
}

/// Reports no metadata for any file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl ExecutableMetadata for NoMetadata {
    fn lookup(&self, _executable: &Path) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}
