use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model not ready: train or load a model bundle first")]
    ModelNotReady,

    #[error("Malformed input: missing required column(s): {}", missing.join(", "))]
    MalformedInput { missing: Vec<String> },

    /// `row` is the 1-based data row: the first record after the header
    /// (or the first element of an in-memory batch) is row 1.
    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("Invalid case: {reason}")]
    InvalidCase { reason: String },

    #[error("Insufficient training data: need at least {required} labelled rows, got {actual}")]
    InsufficientTrainingData { required: usize, actual: usize },

    #[error("Invalid roster: {reason}")]
    InvalidRoster { reason: String },

    #[error("Incompatible bundle: {reason}")]
    IncompatibleBundle { reason: String },

    #[error("Model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DcaResult<T> = Result<T, DcaError>;
