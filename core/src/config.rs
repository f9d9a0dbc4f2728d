use crate::{
    case_generator::DEFAULT_SAMPLE_SIZE,
    error::DcaResult,
    random_forest::ForestParams,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcaConfig {
    /// Master seed for every RNG stream (generator, split, forest, assignment).
    pub seed:          u64,
    /// Directory holding model.json and encoders.json.
    pub artifact_dir:  PathBuf,
    /// Optional roster JSON; the built-in roster is used when absent.
    pub roster_path:   Option<PathBuf>,
    pub forest:        ForestParams,
    /// Fraction of labelled rows held out for evaluation.
    pub test_fraction: f64,
    /// Rows produced by the synthetic generator.
    pub sample_size:   usize,
    /// When true, assignment draws from OS entropy instead of the seed.
    pub entropy_assignment: bool,
}

impl Default for DcaConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            artifact_dir: PathBuf::from("./artifacts"),
            roster_path: None,
            forest: ForestParams::default(),
            test_fraction: DEFAULT_TEST_FRACTION,
            sample_size: DEFAULT_SAMPLE_SIZE,
            entropy_assignment: false,
        }
    }
}

impl DcaConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    /// In tests, use DcaConfig::default_test().
    pub fn load(path: impl AsRef<Path>) -> DcaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: DcaConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Small, fast forest writing into `artifact_dir`.
    pub fn default_test(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed: DEFAULT_SEED,
            artifact_dir: artifact_dir.into(),
            roster_path: None,
            forest: ForestParams {
                n_trees: 15,
                max_depth: 8,
                ..ForestParams::default()
            },
            test_fraction: DEFAULT_TEST_FRACTION,
            sample_size: 400,
            entropy_assignment: false,
        }
    }

    pub fn validate(&self) -> DcaResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(anyhow::anyhow!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )
            .into());
        }
        if self.forest.n_trees == 0 || self.forest.max_depth == 0 {
            return Err(anyhow::anyhow!("forest needs at least one tree of depth >= 1").into());
        }
        if self.forest.max_features == Some(0) {
            return Err(anyhow::anyhow!("forest max_features must be at least 1").into());
        }
        Ok(())
    }
}
