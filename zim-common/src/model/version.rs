// zim-common/src/model/version.rs
//! Four-component `major.minor.patch.build` versions.
//!
//! Parsing is deliberately lenient at the comparison boundary: an unparsable
//! string compares `Equal` to anything through [`compare`], so callers that
//! only drive UI choices never fail. [`compare_checked`] keeps the
//! unparsable case distinguishable for callers that care.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

const COMPONENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTuple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: u64,
}

impl VersionTuple {
    pub const fn new(major: u64, minor: u64, patch: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Parses at most four dot-separated components, padding missing ones with zero.
    /// Components beyond the fourth are ignored without being validated.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = [0u64; COMPONENTS];
        for (slot, raw) in parts.iter_mut().zip(input.split('.')) {
            *slot = raw.trim().parse::<u64>().ok()?;
        }
        Some(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionComparison {
    Greater,
    Lesser,
    Equal,
    /// At least one side could not be parsed.
    Unknown,
}

impl VersionComparison {
    pub fn is_greater(self) -> bool {
        self == VersionComparison::Greater
    }
}

pub fn compare_checked(a: &str, b: &str) -> VersionComparison {
    match (VersionTuple::parse(a), VersionTuple::parse(b)) {
        (Some(left), Some(right)) => match left.cmp(&right) {
            Ordering::Greater => VersionComparison::Greater,
            Ordering::Less => VersionComparison::Lesser,
            Ordering::Equal => VersionComparison::Equal,
        },
        _ => VersionComparison::Unknown,
    }
}

/// Compares two dotted versions; any parse failure yields `Equal`.
pub fn compare(a: &str, b: &str) -> Ordering {
    match compare_checked(a, b) {
        VersionComparison::Greater => Ordering::Greater,
        VersionComparison::Lesser => Ordering::Less,
        VersionComparison::Equal | VersionComparison::Unknown => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_component_wise() {
        assert_eq!(compare("1.2.0.5", "1.2.0.10"), Ordering::Less);
        assert_eq!(compare("2.0", "1.9.9.9"), Ordering::Greater);
        assert_eq!(compare("1.0.0.0", "1.0.0.0"), Ordering::Equal);
        assert_eq!(compare("1.0", "1.0.0.0"), Ordering::Equal);
    }

    #[test]
    fn unparsable_input_folds_to_equal() {
        assert_eq!(compare("bad", "1.0"), Ordering::Equal);
        assert_eq!(compare("1.0", "1.x"), Ordering::Equal);
        assert_eq!(compare("", "0.0.0.1"), Ordering::Equal);
        assert_eq!(compare_checked("bad", "1.0"), VersionComparison::Unknown);
    }

    #[test]
    fn only_first_four_components_count() {
        assert_eq!(compare("1.2.3.4.9", "1.2.3.4"), Ordering::Equal);
        assert_eq!(
            VersionTuple::parse("3.1").map(|v| v.to_string()).as_deref(),
            Some("3.1.0.0")
        );
    }

    #[test]
    fn negative_components_are_rejected() {
        assert_eq!(VersionTuple::parse("1.-2"), None);
    }
}
