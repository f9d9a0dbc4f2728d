//! Classifier pipeline: train, predict, save, load.
//!
//! The live model is an immutable `Arc<ModelBundle>` snapshot. Training
//! builds a fresh bundle and swaps the pointer; callers holding an older
//! snapshot keep a consistent model + encoder pair until they drop it.

use crate::{
    bundle::{ArtifactStore, ModelBundle},
    case::{Case, ScoredCase},
    config::DcaConfig,
    encoder::FeatureEncoders,
    error::{DcaError, DcaResult},
    metrics::ClassificationReport,
    random_forest::{ForestParams, RandomForest, N_CLASSES},
    rng::DcaRng,
    types::{BundleId, RecoveryLikelihood},
};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use rand::seq::SliceRandom;
use std::sync::Arc;

pub const MIN_TRAINING_ROWS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Ready {
        bundle_id:  BundleId,
        trained_at: DateTime<Utc>,
        accuracy:   f64,
    },
    NotReady,
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub bundle_id:  BundleId,
    pub train_rows: usize,
    pub test_rows:  usize,
    pub accuracy:   f64,
    pub report:     ClassificationReport,
}

pub struct ClassifierPipeline {
    store:         ArtifactStore,
    forest_params: ForestParams,
    test_fraction: f64,
    bundle:        Option<Arc<ModelBundle>>,
}

impl ClassifierPipeline {
    pub fn new(config: &DcaConfig) -> Self {
        Self {
            store: ArtifactStore::new(config.artifact_dir.clone()),
            forest_params: config.forest,
            test_fraction: config.test_fraction,
            bundle: None,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn status(&self) -> ModelStatus {
        match &self.bundle {
            Some(b) => ModelStatus::Ready {
                bundle_id: b.bundle_id.clone(),
                trained_at: b.trained_at,
                accuracy: b.accuracy(),
            },
            None => ModelStatus::NotReady,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.bundle.is_some()
    }

    /// Current model snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<ModelBundle>> {
        self.bundle.clone()
    }

    /// Install an already-built bundle without touching disk.
    pub fn install(&mut self, bundle: ModelBundle) {
        self.bundle = Some(Arc::new(bundle));
    }

    /// Fit encoders and forest on labelled cases, evaluate on a held-out
    /// split, persist the bundle and make it live.
    ///
    /// `split_rng` shuffles rows before the split; `forest_rng` drives
    /// bootstrap and feature sampling. Same streams → same model.
    /// Unlabelled rows are reported 1-based, like ingestion errors.
    pub fn train(
        &mut self,
        cases: &[Case],
        split_rng: &mut DcaRng,
        forest_rng: &mut DcaRng,
    ) -> DcaResult<TrainingReport> {
        if cases.len() < MIN_TRAINING_ROWS {
            return Err(DcaError::InsufficientTrainingData {
                required: MIN_TRAINING_ROWS,
                actual: cases.len(),
            });
        }
        let labels = cases
            .iter()
            .enumerate()
            .map(|(i, c)| c.require_label(i + 1))
            .collect::<DcaResult<Vec<_>>>()?;

        let encoders = FeatureEncoders::fit(cases);
        let features = encoders.encode_batch(cases);
        let targets: Array1<usize> = labels.iter().map(RecoveryLikelihood::index).collect();

        let (train_idx, test_idx) = train_test_split(cases.len(), self.test_fraction, split_rng);

        let x_train = features.select(Axis(0), &train_idx);
        let y_train = targets.select(Axis(0), &train_idx);
        let forest = RandomForest::fit(&x_train, &y_train, self.forest_params, forest_rng)?;

        let truth: Vec<RecoveryLikelihood> = test_idx.iter().map(|&i| labels[i]).collect();
        let predicted: Vec<RecoveryLikelihood> = forest
            .predict(&features.select(Axis(0), &test_idx))
            .into_iter()
            .map(|(class, _)| class_label(class))
            .collect();
        let report = ClassificationReport::from_predictions(&truth, &predicted)?;

        log::info!("Model trained. Accuracy: {:.2}", report.accuracy);
        log::info!("Classification report:\n{report}");

        let bundle = ModelBundle::new(forest, encoders, report.clone());
        self.store.save(&bundle)?;

        let summary = TrainingReport {
            bundle_id: bundle.bundle_id.clone(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            accuracy: report.accuracy,
            report,
        };
        self.bundle = Some(Arc::new(bundle));
        Ok(summary)
    }

    /// Score cases with the live model. Input is left untouched; output
    /// preserves row order.
    pub fn predict(&self, cases: &[Case]) -> DcaResult<Vec<ScoredCase>> {
        let bundle = self.bundle.as_ref().ok_or(DcaError::ModelNotReady)?;
        Ok(predict_with(bundle, cases))
    }

    /// Persist the live bundle.
    pub fn save(&self) -> DcaResult<()> {
        let bundle = self.bundle.as_ref().ok_or(DcaError::ModelNotReady)?;
        self.store.save(bundle)
    }

    /// Restore the bundle from disk. Returns false, leaving the current
    /// state untouched, when either artifact is missing or unusable.
    pub fn load(&mut self) -> bool {
        if !self.store.exists() {
            log::warn!(
                "Model bundle not found in {}; pipeline is not ready",
                self.store.dir().display()
            );
            return false;
        }
        match self.store.load() {
            Ok(bundle) => {
                log::info!(
                    "Model bundle {} loaded (accuracy {:.2})",
                    bundle.bundle_id,
                    bundle.accuracy()
                );
                self.bundle = Some(Arc::new(bundle));
                true
            }
            Err(e) => {
                log::warn!("Failed to load model bundle from {}: {e}", self.store.dir().display());
                false
            }
        }
    }
}

/// Score against an explicit snapshot.
pub fn predict_with(bundle: &ModelBundle, cases: &[Case]) -> Vec<ScoredCase> {
    if cases.is_empty() {
        return Vec::new();
    }
    let features = bundle.encoders.encode_batch(cases);
    cases
        .iter()
        .zip(bundle.forest.predict(&features))
        .map(|(case, (class, confidence))| ScoredCase {
            case: case.clone(),
            predicted_recovery: class_label(class),
            confidence_score: confidence,
        })
        .collect()
}

fn class_label(index: usize) -> RecoveryLikelihood {
    debug_assert!(index < N_CLASSES);
    RecoveryLikelihood::from_index(index).unwrap_or(RecoveryLikelihood::Medium)
}

/// Shuffled (train, test) row indices. The test partition holds
/// ceil(n * test_fraction) rows, clamped so both sides are non-empty.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    rng: &mut DcaRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut rows: Vec<usize> = (0..n).collect();
    rows.shuffle(rng);
    if n < 2 {
        return (rows, Vec::new());
    }
    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let train = rows.split_off(n_test);
    (train, rows)
}
