// zim-common/src/model/inspection.rs
use serde::{Deserialize, Serialize};

/// What a scan of an archive's entry list found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInspectionResult {
    /// Bare executable file names, in archive order.
    pub executable_candidates: Vec<String>,
    /// Leading directory to strip from every entry during extraction.
    pub extraction_root: Option<String>,
}

impl ArchiveInspectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn primary_executable(&self) -> Option<&str> {
        self.executable_candidates.first().map(String::as_str)
    }

    pub fn has_executable(&self) -> bool {
        !self.executable_candidates.is_empty()
    }

    /// Path of a candidate as it appears inside the archive.
    pub fn entry_name(&self, candidate: &str) -> String {
        match &self.extraction_root {
            Some(root) => format!("{root}/{candidate}"),
            None => candidate.to_string(),
        }
    }
}
