//! Bagged ensemble of linfa decision trees with majority voting.
//!
//! Each member is a Gini CART tree (linfa-trees) grown on a bootstrap
//! resample of the training rows, optionally restricted to a random
//! subset of feature columns. Class probabilities are the share of
//! member votes per class; the predicted class is their argmax (lowest
//! class index on ties) and the confidence is the winning share.

use crate::{
    encoder::FEATURE_COUNT,
    error::{DcaError, DcaResult},
    rng::DcaRng,
};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::{seq::index, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of recovery classes the forest votes over.
pub const N_CLASSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees:           usize,
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub bootstrap:         bool,
    /// Feature columns each tree sees. `None` means every column.
    pub max_features:      Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            bootstrap: true,
            max_features: None,
        }
    }
}

impl ForestParams {
    /// Columns per tree, clamped to [1, FEATURE_COUNT].
    pub fn features_per_tree(&self) -> usize {
        self.max_features.unwrap_or(FEATURE_COUNT).clamp(1, FEATURE_COUNT)
    }
}

/// One fitted tree and the feature columns it was grown on.
#[derive(Serialize, Deserialize)]
struct ForestMember {
    features: Vec<usize>,
    tree:     DecisionTree<f64, usize>,
}

impl ForestMember {
    fn vote(&self, x: &Array2<f64>) -> Array1<usize> {
        if self.features.len() == FEATURE_COUNT {
            self.tree.predict(x)
        } else {
            self.tree.predict(&x.select(Axis(1), &self.features))
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees:  Vec<ForestMember>,
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("params", &self.params)
            .field("trees", &self.trees.len())
            .finish()
    }
}

impl RandomForest {
    /// Fit on `x` (one row per case, `FEATURE_COUNT` columns) and class
    /// indices `y`. All randomness (bootstrap rows, feature subsets)
    /// comes from `rng`; tree growth itself is deterministic.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        params: ForestParams,
        rng: &mut DcaRng,
    ) -> DcaResult<Self> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(DcaError::Model {
                reason: format!("cannot fit a forest on {n} rows and {} labels", y.len()),
            });
        }
        if x.ncols() != FEATURE_COUNT {
            return Err(DcaError::Model {
                reason: format!("expected {FEATURE_COUNT} feature columns, got {}", x.ncols()),
            });
        }

        let tree_params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(Some(params.max_depth))
            .min_weight_split(params.min_samples_split.max(2) as f32);
        let n_features = params.features_per_tree();

        let mut trees = Vec::with_capacity(params.n_trees.max(1));
        for _ in 0..params.n_trees.max(1) {
            let rows: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let features = sample_features(n_features, rng);

            let records = x.select(Axis(0), &rows).select(Axis(1), &features);
            let targets = y.select(Axis(0), &rows);
            let tree = tree_params
                .fit(&Dataset::new(records, targets))
                .map_err(|e| DcaError::Model { reason: e.to_string() })?;
            trees.push(ForestMember { features, tree });
        }

        log::debug!(
            "Grew {} trees on {n} rows (max_depth={}, features per tree={n_features})",
            trees.len(),
            params.max_depth,
        );

        Ok(Self { params, trees })
    }

    /// Per-row vote shares, shape (rows, N_CLASSES).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut votes = Array2::<f64>::zeros((x.nrows(), N_CLASSES));
        for member in &self.trees {
            for (row, class) in member.vote(x).iter().enumerate() {
                if *class < N_CLASSES {
                    votes[[row, *class]] += 1.0;
                }
            }
        }
        votes / self.trees.len().max(1) as f64
    }

    /// (class index, vote share) per row.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<(usize, f64)> {
        self.predict_proba(x)
            .rows()
            .into_iter()
            .map(|p| argmax(p.as_slice().unwrap_or(&[0.0; N_CLASSES])))
            .collect()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Every member references only columns that exist.
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self.trees.iter().all(|m| {
                !m.features.is_empty()
                    && m.features.iter().all(|&f| f < FEATURE_COUNT)
                    && m.tree.features().iter().all(|&f| f < m.features.len())
            })
    }
}

/// Sorted feature columns for one tree. Draws nothing when every
/// column is used, so the default forest only consumes bootstrap draws.
fn sample_features(k: usize, rng: &mut DcaRng) -> Vec<usize> {
    if k >= FEATURE_COUNT {
        return (0..FEATURE_COUNT).collect();
    }
    let mut picked = index::sample(rng, FEATURE_COUNT, k).into_vec();
    picked.sort_unstable();
    picked
}

pub fn argmax(p: &[f64]) -> (usize, f64) {
    let mut best = (0, p.first().copied().unwrap_or(0.0));
    for (i, v) in p.iter().enumerate().skip(1) {
        if *v > best.1 {
            best = (i, *v);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((60, FEATURE_COUNT), |(i, j)| match j {
            0 => (i % 3) as f64 * 10.0 + (i % 5) as f64,
            1 => (i * 7 % 13) as f64,
            4 => (i % 4) as f64,
            _ => 1.0,
        });
        let y = Array1::from_shape_fn(60, |i| i % 3);
        (x, y)
    }

    #[test]
    fn argmax_prefers_lowest_index_on_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), (0, 0.4));
        assert_eq!(argmax(&[0.1, 0.3, 0.6]), (2, 0.6));
    }

    #[test]
    fn same_seed_gives_identical_predictions() {
        let (x, y) = toy_data();
        let params = ForestParams { n_trees: 5, ..ForestParams::default() };

        let a = RandomForest::fit(&x, &y, params, &mut DcaRng::new(9, 2)).unwrap();
        let b = RandomForest::fit(&x, &y, params, &mut DcaRng::new(9, 2)).unwrap();

        assert_eq!(a.tree_count(), 5);
        assert_eq!(a.predict(&x), b.predict(&x));
        assert!(a.is_well_formed());
    }

    #[test]
    fn vote_shares_sum_to_one() {
        let (x, y) = toy_data();
        let params = ForestParams { n_trees: 7, ..ForestParams::default() };
        let forest = RandomForest::fit(&x, &y, params, &mut DcaRng::new(1, 2)).unwrap();

        let proba = forest.predict_proba(&x);
        assert_eq!(proba.dim(), (60, N_CLASSES));
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    /// The first column alone separates the classes, so a forest that
    /// sees every column fits the training rows exactly.
    #[test]
    fn separable_column_is_learned() {
        let (x, y) = toy_data();
        let params = ForestParams { n_trees: 9, bootstrap: false, ..ForestParams::default() };
        let forest = RandomForest::fit(&x, &y, params, &mut DcaRng::new(4, 2)).unwrap();

        for (i, (class, share)) in forest.predict(&x).into_iter().enumerate() {
            assert_eq!(class, y[i]);
            assert_eq!(share, 1.0);
        }
    }

    #[test]
    fn feature_subsets_are_sorted_and_distinct() {
        let params = ForestParams { n_trees: 6, max_features: Some(2), ..ForestParams::default() };
        let (x, y) = toy_data();
        let forest = RandomForest::fit(&x, &y, params, &mut DcaRng::new(5, 2)).unwrap();

        assert!(forest.is_well_formed());
        for member in &forest.trees {
            assert_eq!(member.features.len(), 2);
            assert!(member.features[0] < member.features[1]);
        }
        assert_eq!(forest.predict(&x).len(), 60);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let (x, _) = toy_data();
        let y = Array1::from_elem(10, 0usize);
        let err = RandomForest::fit(&x, &y, ForestParams::default(), &mut DcaRng::new(0, 2));
        assert!(matches!(err, Err(DcaError::Model { .. })));
    }
}
