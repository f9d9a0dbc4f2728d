//! Categorical feature encoding.
//!
//! Code 0 is reserved for values not seen at fit time. Observed
//! categories get codes 1..=n in sorted order, so the unknown fallback
//! never collides with a trained category.

use crate::case::Case;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const UNKNOWN_CODE: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Observed categories; `classes[i]` has code `i + 1`.
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl CategoryEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        Self::from_classes(distinct.into_iter().map(str::to_string).collect())
    }

    fn from_classes(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32 + 1))
            .collect();
        Self { classes, index }
    }

    /// Rebuild the lookup table after deserialization.
    pub(crate) fn reindex(self) -> Self {
        Self::from_classes(self.classes)
    }

    /// Fails soft: unseen values map to `UNKNOWN_CODE`.
    pub fn transform(&self, value: &str) -> u32 {
        self.index.get(value).copied().unwrap_or(UNKNOWN_CODE)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        if code == UNKNOWN_CODE {
            return None;
        }
        self.classes.get(code as usize - 1).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_known(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }
}

/// The two independently encoded categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoders {
    pub customer_type:   CategoryEncoder,
    pub payment_history: CategoryEncoder,
}

impl FeatureEncoders {
    pub fn fit(cases: &[Case]) -> Self {
        Self {
            customer_type: CategoryEncoder::fit(cases.iter().map(Case::customer_type)),
            payment_history: CategoryEncoder::fit(cases.iter().map(Case::payment_history)),
        }
    }

    pub(crate) fn reindex(self) -> Self {
        Self {
            customer_type: self.customer_type.reindex(),
            payment_history: self.payment_history.reindex(),
        }
    }

    /// Numeric feature vector in the fixed column order of `FEATURE_NAMES`.
    pub fn encode(&self, case: &Case) -> FeatureVector {
        [
            case.amount_owed(),
            case.days_overdue() as f64,
            self.customer_type.transform(case.customer_type()) as f64,
            self.payment_history.transform(case.payment_history()) as f64,
            case.contact_attempts() as f64,
        ]
    }

    /// Feature matrix, one row per case, shape (cases.len(), FEATURE_COUNT).
    pub fn encode_batch(&self, cases: &[Case]) -> Array2<f64> {
        let rows: Vec<FeatureVector> = cases.iter().map(|c| self.encode(c)).collect();
        Array2::from_shape_fn((rows.len(), FEATURE_COUNT), |(i, j)| rows[i][j])
    }
}

pub const FEATURE_COUNT: usize = 5;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "amount_owed",
    "days_overdue",
    "customer_type",
    "payment_history",
    "contact_attempts",
];

pub type FeatureVector = [f64; FEATURE_COUNT];
