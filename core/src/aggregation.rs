//! Per-agency load statistics and batch-level insight figures.
//!
//! Pure functions over an assigned batch. No state, no I/O.

use crate::{
    case::AssignedCase,
    types::RecoveryLikelihood,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Days overdue beyond which a case counts as critical.
pub const CRITICAL_OVERDUE_DAYS: u32 = 120;

/// What `avg_likelihood_score` measures for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    /// Mean confidence score of the group's scored cases.
    Confidence,
    /// The batch carried no confidence scores; the value is the case count.
    CaseCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyStats {
    pub dca_assigned:         String,
    pub cases_assigned:       usize,
    pub total_amount:         f64,
    pub avg_likelihood_score: f64,
    pub score_basis:          ScoreBasis,
}

#[derive(Default)]
struct GroupAccumulator {
    cases:            usize,
    total_amount:     f64,
    confidence_sum:   f64,
    confidence_count: usize,
}

/// Group by assigned agency. Groups come back sorted by agency name.
pub fn summarize(cases: &[AssignedCase]) -> Vec<AgencyStats> {
    if cases.is_empty() {
        return Vec::new();
    }

    let batch_has_confidence = cases.iter().any(|c| c.confidence_score.is_some());
    let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();

    for case in cases {
        let group = groups.entry(case.dca_assigned.as_str()).or_default();
        group.cases += 1;
        group.total_amount += case.case.amount_owed();
        if let Some(confidence) = case.confidence_score {
            group.confidence_sum += confidence;
            group.confidence_count += 1;
        }
    }

    groups
        .into_iter()
        .map(|(agency, g)| {
            let (avg_likelihood_score, score_basis) = if batch_has_confidence {
                let mean = if g.confidence_count > 0 {
                    g.confidence_sum / g.confidence_count as f64
                } else {
                    0.0
                };
                (mean, ScoreBasis::Confidence)
            } else {
                (g.cases as f64, ScoreBasis::CaseCount)
            };
            AgencyStats {
                dca_assigned: agency.to_string(),
                cases_assigned: g.cases,
                total_amount: g.total_amount,
                avg_likelihood_score,
                score_basis,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikelihoodCounts {
    pub high:   usize,
    pub medium: usize,
    pub low:    usize,
}

impl LikelihoodCounts {
    fn record(&mut self, likelihood: RecoveryLikelihood) {
        match likelihood {
            RecoveryLikelihood::High   => self.high += 1,
            RecoveryLikelihood::Medium => self.medium += 1,
            RecoveryLikelihood::Low    => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAmount {
    pub region:       String,
    pub total_amount: f64,
}

/// Dashboard and insight figures for one assigned batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_cases:            usize,
    pub amount_at_risk:         f64,
    pub avg_confidence:         Option<f64>,
    pub active_agencies:        usize,
    pub likelihood_counts:      LikelihoodCounts,
    pub amount_by_region:       Vec<RegionAmount>,
    pub high_priority_cases:    usize,
    pub potential_recovery:     f64,
    pub critical_overdue_cases: usize,
    pub avg_days_overdue:       Option<f64>,
}

impl BatchSummary {
    pub fn from_cases(cases: &[AssignedCase]) -> Self {
        let mut likelihood_counts = LikelihoodCounts::default();
        let mut by_region: BTreeMap<&str, f64> = BTreeMap::new();
        let mut agencies: HashSet<&str> = HashSet::new();
        let mut amount_at_risk = 0.0;
        let mut potential_recovery = 0.0;
        let mut confidence_sum = 0.0;
        let mut confidence_count = 0usize;
        let mut overdue_sum = 0u64;
        let mut critical_overdue_cases = 0;

        for c in cases {
            let likelihood = c.routing_likelihood();
            likelihood_counts.record(likelihood);
            amount_at_risk += c.case.amount_owed();
            *by_region.entry(c.case.region()).or_default() += c.case.amount_owed();
            agencies.insert(c.dca_assigned.as_str());

            if likelihood == RecoveryLikelihood::High {
                potential_recovery += c.case.amount_owed();
            }
            if let Some(confidence) = c.confidence_score {
                confidence_sum += confidence;
                confidence_count += 1;
            }
            overdue_sum += u64::from(c.case.days_overdue());
            if c.case.days_overdue() > CRITICAL_OVERDUE_DAYS {
                critical_overdue_cases += 1;
            }
        }

        Self {
            total_cases: cases.len(),
            amount_at_risk,
            avg_confidence: (confidence_count > 0).then(|| confidence_sum / confidence_count as f64),
            active_agencies: agencies.len(),
            likelihood_counts,
            amount_by_region: by_region
                .into_iter()
                .map(|(region, total_amount)| RegionAmount {
                    region: region.to_string(),
                    total_amount,
                })
                .collect(),
            high_priority_cases: likelihood_counts.high,
            potential_recovery,
            critical_overdue_cases,
            avg_days_overdue: (!cases.is_empty()).then(|| overdue_sum as f64 / cases.len() as f64),
        }
    }
}

/// Narrow an assigned batch. An empty set places no constraint on
/// its column.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub likelihoods: BTreeSet<RecoveryLikelihood>,
    pub regions:     BTreeSet<String>,
    pub agencies:    BTreeSet<String>,
}

impl CaseFilter {
    pub fn matches(&self, case: &AssignedCase) -> bool {
        (self.likelihoods.is_empty() || self.likelihoods.contains(&case.routing_likelihood()))
            && (self.regions.is_empty() || self.regions.contains(case.case.region()))
            && (self.agencies.is_empty() || self.agencies.contains(&case.dca_assigned))
    }

    /// Matching cases in input order.
    pub fn apply<'a>(&self, cases: &'a [AssignedCase]) -> Vec<&'a AssignedCase> {
        cases.iter().filter(|c| self.matches(c)).collect()
    }
}
