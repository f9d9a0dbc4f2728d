//! Agency roster: the static table of collection agencies.
//!
//! RULE: The roster is read-only once built. Assignment borrows it;
//! nothing in the core mutates it.

use crate::{
    error::{DcaError, DcaResult},
    types::Specialty,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub name:        String,
    pub region:      String,
    pub specialty:   Specialty,
    /// Historical success rate in [0, 1].
    pub performance: f64,
}

impl Agency {
    pub fn new(name: &str, region: &str, specialty: Specialty, performance: f64) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            specialty,
            performance,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    agencies: Vec<Agency>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    agencies: Vec<Agency>,
}

impl Roster {
    /// Validated constructor: non-empty, unique names, performance in [0, 1].
    pub fn new(agencies: Vec<Agency>) -> DcaResult<Self> {
        if agencies.is_empty() {
            return Err(DcaError::InvalidRoster {
                reason: "roster must contain at least one agency".into(),
            });
        }
        let mut seen = HashSet::new();
        for agency in &agencies {
            if agency.name.trim().is_empty() {
                return Err(DcaError::InvalidRoster {
                    reason: "agency name must not be blank".into(),
                });
            }
            if !seen.insert(agency.name.as_str()) {
                return Err(DcaError::InvalidRoster {
                    reason: format!("duplicate agency name '{}'", agency.name),
                });
            }
            if !(0.0..=1.0).contains(&agency.performance) {
                return Err(DcaError::InvalidRoster {
                    reason: format!(
                        "agency '{}' performance {} outside [0, 1]",
                        agency.name, agency.performance
                    ),
                });
            }
        }
        Ok(Self { agencies })
    }

    /// The built-in six-agency roster.
    pub fn standard() -> Self {
        Self {
            agencies: vec![
                Agency::new("Alpha Collections", "North", Specialty::High,    0.85),
                Agency::new("Beta Recovery",     "South", Specialty::General, 0.72),
                Agency::new("Gamma Partners",    "East",  Specialty::High,    0.78),
                Agency::new("Delta Agency",      "West",  Specialty::Low,     0.65),
                Agency::new("Epsilon Group",     "North", Specialty::General, 0.70),
                Agency::new("Zeta Solutions",    "East",  Specialty::Low,     0.60),
            ],
        }
    }

    /// Load `{ "agencies": [...] }` from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> DcaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let file: RosterFile = serde_json::from_str(&content)?;
        let roster = Self::new(file.agencies)?;
        log::info!("Loaded roster of {} agencies from {}", roster.len(), path.display());
        Ok(roster)
    }

    pub fn agencies(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn len(&self) -> usize {
        self.agencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agencies.is_empty()
    }

    pub fn in_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a Agency> + 'a {
        self.agencies.iter().filter(move |a| a.region == region)
    }

    pub fn get(&self, name: &str) -> Option<&Agency> {
        self.agencies.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}
