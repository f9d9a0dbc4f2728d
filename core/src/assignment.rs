//! Rule-based agency assignment.
//!
//! Candidate selection, evaluated in order:
//!   1. High:   agencies in region with performance > 0.75,
//!               else every agency in region.
//!   2. Low:    agencies in region with Low specialty,
//!               else every agency in region.
//!   3. Medium: every agency in region (also the default when the
//!               likelihood is missing).
//!   4. Region has no agencies at all: the whole roster.
//!
//! The final pick is a uniform draw from the caller's RNG. No workload
//! state is kept between calls; repeated assignment of the same case may
//! land on different agencies unless the RNG is seeded identically.

use crate::{
    case::{routing_likelihood, AssignedCase, Case, ScoredCase},
    rng::DcaRng,
    roster::{Agency, Roster},
    types::{RecoveryLikelihood, Specialty},
};
use rand::seq::SliceRandom;

pub const HIGH_PERFORMANCE_THRESHOLD: f64 = 0.75;

/// Which rule produced the final candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRule {
    TopPerformers,
    LowSpecialists,
    Region,
    RegionFallback,
    RosterFallback,
}

pub struct AssignmentEngine<'r> {
    roster: &'r Roster,
}

impl<'r> AssignmentEngine<'r> {
    pub fn new(roster: &'r Roster) -> Self {
        Self { roster }
    }

    pub fn roster(&self) -> &'r Roster {
        self.roster
    }

    /// Final candidate set for a region and likelihood. Never empty
    /// while the roster is non-empty.
    pub fn candidates(
        &self,
        region: &str,
        likelihood: Option<RecoveryLikelihood>,
    ) -> (Vec<&'r Agency>, CandidateRule) {
        let roster: &'r Roster = self.roster;
        let in_region: Vec<&'r Agency> =
            roster.agencies().iter().filter(|a| a.region == region).collect();

        let (preferred, rule) = match likelihood.unwrap_or(RecoveryLikelihood::Medium) {
            RecoveryLikelihood::High => (
                in_region
                    .iter()
                    .copied()
                    .filter(|a| a.performance > HIGH_PERFORMANCE_THRESHOLD)
                    .collect::<Vec<_>>(),
                CandidateRule::TopPerformers,
            ),
            RecoveryLikelihood::Low => (
                in_region
                    .iter()
                    .copied()
                    .filter(|a| a.specialty == Specialty::Low)
                    .collect::<Vec<_>>(),
                CandidateRule::LowSpecialists,
            ),
            RecoveryLikelihood::Medium => (in_region.clone(), CandidateRule::Region),
        };

        if !preferred.is_empty() {
            return (preferred, rule);
        }
        if !in_region.is_empty() {
            return (in_region, CandidateRule::RegionFallback);
        }

        log::warn!("No agency serves region '{region}'; falling back to the full roster");
        (roster.agencies().iter().collect(), CandidateRule::RosterFallback)
    }

    /// Pick an agency for one case.
    pub fn assign(
        &self,
        region: &str,
        likelihood: Option<RecoveryLikelihood>,
        rng: &mut DcaRng,
    ) -> &'r Agency {
        let (candidates, _) = self.candidates(region, likelihood);
        match candidates.choose(rng).copied() {
            Some(agency) => agency,
            None => unreachable!("Roster::new rejects an empty roster"),
        }
    }

    pub fn assign_case(&self, case: &Case, rng: &mut DcaRng) -> &'r Agency {
        self.assign(case.region(), case.recovery_likelihood(), rng)
    }

    /// Assign every scored case; output order matches input order.
    pub fn assign_scored(&self, scored: Vec<ScoredCase>, rng: &mut DcaRng) -> Vec<AssignedCase> {
        scored
            .into_iter()
            .map(|s| {
                let likelihood = routing_likelihood(Some(s.predicted_recovery), &s.case);
                let agency = self.assign(s.case.region(), Some(likelihood), rng);
                AssignedCase::from_scored(s, agency.name.clone())
            })
            .collect()
    }

    /// Assign cases that were never scored, routing on their
    /// ground-truth label when one is present.
    pub fn assign_unscored(&self, cases: Vec<Case>, rng: &mut DcaRng) -> Vec<AssignedCase> {
        cases
            .into_iter()
            .map(|case| {
                let agency = self.assign_case(&case, rng);
                AssignedCase::unscored(case, agency.name.clone())
            })
            .collect()
    }
}
