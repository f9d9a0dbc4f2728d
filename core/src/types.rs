//! Shared primitive types used across the allocation core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A case identifier, unique within a batch.
pub type CaseId = String;

/// The canonical model bundle identifier.
pub type BundleId = String;

/// Three-tier estimate of how likely a case is to be collected.
///
/// The declaration order is also the class index order used by the
/// classifier. NEVER reorder: persisted bundles store class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecoveryLikelihood {
    High,
    Medium,
    Low,
}

impl RecoveryLikelihood {
    pub const ALL: [RecoveryLikelihood; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Self::High   => "High",
            Self::Medium => "Medium",
            Self::Low    => "Low",
        }
    }

    /// Class index inside the classifier's probability vector.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for RecoveryLikelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecoveryLikelihood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high"   => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low"    => Ok(Self::Low),
            other    => Err(format!("unknown recovery likelihood '{other}'")),
        }
    }
}

/// The difficulty tier an agency is best suited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    High,
    General,
    Low,
}

impl Specialty {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High    => "High",
            Self::General => "General",
            Self::Low     => "Low",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
