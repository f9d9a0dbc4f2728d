//! Model bundle (the fitted forest plus the encoders that produced
//! its input features) and its on-disk persistence.
//!
//! RULE: Only this module reads or writes artifact files.
//!
//! A bundle is stored as two artifacts in one directory:
//!   model.json     : forest parameters and trees
//!   encoders.json  : both categorical encoders
//! Each artifact carries the bundle id and format version. A pair whose
//! ids or versions disagree is rejected on load, so a model can never be
//! served with another training run's encoders.

use crate::{
    encoder::FeatureEncoders,
    error::{DcaError, DcaResult},
    metrics::ClassificationReport,
    random_forest::RandomForest,
    types::BundleId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Bump when the artifact layout changes. Older bundles are refused.
pub const BUNDLE_FORMAT_VERSION: u32 = 2;

pub const MODEL_FILE: &str = "model.json";
pub const ENCODERS_FILE: &str = "encoders.json";

#[derive(Debug)]
pub struct ModelBundle {
    pub bundle_id:  BundleId,
    pub trained_at: DateTime<Utc>,
    pub forest:     RandomForest,
    pub encoders:   FeatureEncoders,
    /// Held-out evaluation at training time.
    pub report:     ClassificationReport,
}

impl ModelBundle {
    pub fn new(
        forest: RandomForest,
        encoders: FeatureEncoders,
        report: ClassificationReport,
    ) -> Self {
        Self {
            bundle_id: uuid::Uuid::new_v4().to_string(),
            trained_at: Utc::now(),
            forest,
            encoders,
            report,
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }
}

/// On-disk model artifact, borrowed for writing.
#[derive(Serialize)]
struct ModelArtifactRef<'a> {
    format_version: u32,
    bundle_id:      &'a str,
    trained_at:     DateTime<Utc>,
    report:         &'a ClassificationReport,
    forest:         &'a RandomForest,
}

/// On-disk model artifact, owned for reading.
#[derive(Deserialize)]
struct ModelArtifact {
    format_version: u32,
    bundle_id:      BundleId,
    trained_at:     DateTime<Utc>,
    report:         ClassificationReport,
    forest:         RandomForest,
}

#[derive(Serialize)]
struct EncodersArtifactRef<'a> {
    format_version: u32,
    bundle_id:      &'a str,
    encoders:       &'a FeatureEncoders,
}

#[derive(Deserialize)]
struct EncodersArtifact {
    format_version: u32,
    bundle_id:      BundleId,
    encoders:       FeatureEncoders,
}

/// Filesystem location of one bundle.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn encoders_path(&self) -> PathBuf {
        self.dir.join(ENCODERS_FILE)
    }

    /// True when both artifact files exist. Says nothing about validity.
    pub fn exists(&self) -> bool {
        self.model_path().is_file() && self.encoders_path().is_file()
    }

    pub fn save(&self, bundle: &ModelBundle) -> DcaResult<()> {
        fs::create_dir_all(&self.dir)?;

        let model = ModelArtifactRef {
            format_version: BUNDLE_FORMAT_VERSION,
            bundle_id: &bundle.bundle_id,
            trained_at: bundle.trained_at,
            report: &bundle.report,
            forest: &bundle.forest,
        };
        let encoders = EncodersArtifactRef {
            format_version: BUNDLE_FORMAT_VERSION,
            bundle_id: &bundle.bundle_id,
            encoders: &bundle.encoders,
        };

        // Encoders first: a crash between writes leaves a pair with
        // mismatched ids, which load() rejects.
        write_atomic(&self.encoders_path(), &serde_json::to_vec(&encoders)?)?;
        write_atomic(&self.model_path(), &serde_json::to_vec(&model)?)?;

        log::info!(
            "Model bundle {} saved to {}",
            bundle.bundle_id,
            self.dir.display()
        );
        Ok(())
    }

    pub fn load(&self) -> DcaResult<ModelBundle> {
        let model: ModelArtifact = serde_json::from_slice(&fs::read(self.model_path())?)?;
        let encoders: EncodersArtifact =
            serde_json::from_slice(&fs::read(self.encoders_path())?)?;

        for (artifact, version) in [
            (MODEL_FILE, model.format_version),
            (ENCODERS_FILE, encoders.format_version),
        ] {
            if version != BUNDLE_FORMAT_VERSION {
                return Err(DcaError::IncompatibleBundle {
                    reason: format!(
                        "{artifact} has format version {version}, expected {BUNDLE_FORMAT_VERSION}"
                    ),
                });
            }
        }
        if model.bundle_id != encoders.bundle_id {
            return Err(DcaError::IncompatibleBundle {
                reason: format!(
                    "model bundle id {} does not match encoders bundle id {}",
                    model.bundle_id, encoders.bundle_id
                ),
            });
        }
        if !model.forest.is_well_formed() {
            return Err(DcaError::IncompatibleBundle {
                reason: "forest structure is invalid".into(),
            });
        }

        Ok(ModelBundle {
            bundle_id: model.bundle_id,
            trained_at: model.trained_at,
            forest: model.forest,
            encoders: encoders.encoders.reindex(),
            report: model.report,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> DcaResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
