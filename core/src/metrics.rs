//! Held-out evaluation: accuracy and a per-class precision/recall report.
//!
//! Diagnostic only. Nothing downstream branches on these figures.

use crate::{
    error::{DcaError, DcaResult},
    types::RecoveryLikelihood,
};
use linfa::prelude::*;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label:     RecoveryLikelihood,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes:         Vec<ClassMetrics>,
    pub accuracy:        f64,
    pub macro_precision: f64,
    pub macro_recall:    f64,
    pub macro_f1:        f64,
    pub weighted_f1:     f64,
    pub total:           usize,
}

impl ClassificationReport {
    /// Build from parallel (truth, prediction) slices. Headline figures
    /// come from linfa's confusion matrix; classes with no support and
    /// no predictions are omitted from the per-class rows.
    pub fn from_predictions(
        truth: &[RecoveryLikelihood],
        predicted: &[RecoveryLikelihood],
    ) -> DcaResult<Self> {
        if truth.len() != predicted.len() {
            return Err(DcaError::Model {
                reason: format!(
                    "{} ground-truth labels but {} predictions",
                    truth.len(),
                    predicted.len()
                ),
            });
        }
        let total = truth.len();
        if total == 0 {
            return Ok(Self::empty());
        }

        let classes = per_class(truth, predicted);

        let truth_idx: Array1<usize> = truth.iter().map(RecoveryLikelihood::index).collect();
        let pred_idx: Array1<usize> = predicted.iter().map(RecoveryLikelihood::index).collect();
        let cm = pred_idx
            .confusion_matrix(truth_idx.view())
            .map_err(|e| DcaError::Model { reason: e.to_string() })?;
        log::debug!("Confusion matrix: {cm:?}");

        let mean = |f: fn(&ClassMetrics) -> f64| {
            classes.iter().map(f).sum::<f64>() / classes.len().max(1) as f64
        };
        let weighted_f1 =
            classes.iter().map(|c| c.f1 * c.support as f64).sum::<f64>() / total as f64;

        Ok(Self {
            accuracy: finite_or(cm.accuracy(), 0.0),
            // linfa yields NaN when a class is never predicted; fall back
            // to the zero-for-undefined per-class mean.
            macro_precision: finite_or(cm.precision(), mean(|c| c.precision)),
            macro_recall: finite_or(cm.recall(), mean(|c| c.recall)),
            macro_f1: mean(|c| c.f1),
            weighted_f1,
            classes,
            total,
        })
    }

    fn empty() -> Self {
        Self {
            classes: Vec::new(),
            accuracy: 0.0,
            macro_precision: 0.0,
            macro_recall: 0.0,
            macro_f1: 0.0,
            weighted_f1: 0.0,
            total: 0,
        }
    }
}

fn per_class(truth: &[RecoveryLikelihood], predicted: &[RecoveryLikelihood]) -> Vec<ClassMetrics> {
    RecoveryLikelihood::ALL
        .iter()
        .filter_map(|&label| {
            let tp = truth
                .iter()
                .zip(predicted)
                .filter(|(t, p)| **t == label && **p == label)
                .count();
            let support = truth.iter().filter(|t| **t == label).count();
            let predicted_n = predicted.iter().filter(|p| **p == label).count();
            if support == 0 && predicted_n == 0 {
                return None;
            }
            let precision = ratio(tp, predicted_n);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            Some(ClassMetrics { label, precision, recall, f1, support })
        })
        .collect()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Serialized reports must stay valid JSON, so NaN never escapes.
fn finite_or(v: f32, fallback: f64) -> f64 {
    let v = f64::from(v);
    if v.is_finite() { v } else { fallback }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.label(), c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        writeln!(
            f,
            "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, self.total
        )?;
        write!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "weighted f1", "", "", self.weighted_f1, self.total)
    }
}
