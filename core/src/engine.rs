//! The batch engine, the context object every operation runs through.
//!
//! It owns the configuration, the agency roster, the classifier pipeline
//! and the RNG bank. Nothing in the core reaches for global state; tests
//! build an engine around fixture rosters and temporary artifact dirs.
//!
//! PROCESSING ORDER (fixed):
//!   1. Classifier pipeline scores every case
//!   2. Assignment engine routes every scored case
//!   3. Aggregation summarizes the assigned batch
//!
//! RULES:
//!   - Output row order always equals input row order.
//!   - All randomness flows through the RngBank unless the config
//!     explicitly opts assignment into OS entropy.

use crate::{
    aggregation::{summarize, AgencyStats, BatchSummary},
    assignment::AssignmentEngine,
    case::{AssignedCase, Case, ScoredCase},
    case_generator::generate_cases,
    config::DcaConfig,
    error::DcaResult,
    pipeline::{ClassifierPipeline, ModelStatus, TrainingReport},
    rng::{DcaRng, RngBank, RngSlot},
    roster::Roster,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedBatch {
    pub cases:        Vec<AssignedCase>,
    pub agency_stats: Vec<AgencyStats>,
    pub summary:      BatchSummary,
}

pub struct BatchEngine {
    pub config:   DcaConfig,
    pub rng_bank: RngBank,
    roster:       Roster,
    pipeline:     ClassifierPipeline,
}

impl BatchEngine {
    /// Wire an engine without touching disk. The pipeline starts not ready.
    pub fn new(config: DcaConfig, roster: Roster) -> Self {
        Self {
            rng_bank: RngBank::new(config.seed),
            pipeline: ClassifierPipeline::new(&config),
            roster,
            config,
        }
    }

    /// Build a fully wired engine: roster from config (or the standard
    /// roster), and an attempt to load the persisted model bundle.
    /// A missing bundle is not an error; check `status()`.
    pub fn build(config: DcaConfig) -> DcaResult<Self> {
        config.validate()?;
        let roster = match &config.roster_path {
            Some(path) => Roster::load(path)?,
            None => Roster::standard(),
        };
        let mut engine = Self::new(config, roster);
        engine.pipeline.load();
        Ok(engine)
    }

    pub fn status(&self) -> ModelStatus {
        self.pipeline.status()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn pipeline(&self) -> &ClassifierPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ClassifierPipeline {
        &mut self.pipeline
    }

    pub fn assigner(&self) -> AssignmentEngine<'_> {
        AssignmentEngine::new(&self.roster)
    }

    /// Labelled synthetic cases from the generator stream.
    pub fn generate_training_data(&self, n: usize) -> DcaResult<Vec<Case>> {
        let mut rng = self.rng_bank.for_slot(RngSlot::Generator);
        generate_cases(n, &mut rng)
    }

    pub fn train(&mut self, cases: &[Case]) -> DcaResult<TrainingReport> {
        let mut split_rng = self.rng_bank.for_slot(RngSlot::Split);
        let mut forest_rng = self.rng_bank.for_slot(RngSlot::Forest);
        self.pipeline.train(cases, &mut split_rng, &mut forest_rng)
    }

    pub fn predict(&self, cases: &[Case]) -> DcaResult<Vec<ScoredCase>> {
        self.pipeline.predict(cases)
    }

    /// Fresh assignment stream for one batch.
    pub fn assignment_rng(&self) -> DcaRng {
        if self.config.entropy_assignment {
            DcaRng::from_entropy()
        } else {
            self.rng_bank.for_slot(RngSlot::Assignment)
        }
    }

    /// Predict, assign and summarize one batch.
    pub fn process(&self, cases: &[Case]) -> DcaResult<ProcessedBatch> {
        let mut rng = self.assignment_rng();
        self.process_with_rng(cases, &mut rng)
    }

    pub fn process_with_rng(&self, cases: &[Case], rng: &mut DcaRng) -> DcaResult<ProcessedBatch> {
        let scored = self.pipeline.predict(cases)?;
        let assigned = self.assigner().assign_scored(scored, rng);
        let agency_stats = summarize(&assigned);
        let summary = BatchSummary::from_cases(&assigned);

        log::info!(
            "Processed {} cases across {} agencies",
            summary.total_cases,
            summary.active_agencies
        );

        Ok(ProcessedBatch {
            cases: assigned,
            agency_stats,
            summary,
        })
    }
}
