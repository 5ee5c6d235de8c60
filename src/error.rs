use std::path::PathBuf;
use thiserror::Error;

/// The model artifact could not be brought into memory. Fatal for the service.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found at {}", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt model artifact {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("incompatible model artifact: {0}")]
    Incompatible(String),

    #[error("unsupported model artifact {}: {reason}", .path.display())]
    Unsupported { path: PathBuf, reason: String },

    #[error("model warm-up failed: {0}")]
    Warmup(#[from] PredictionError),

    #[cfg(feature = "torch")]
    #[error("failed to load TorchScript module {}: {source}", .path.display())]
    Torch {
        path: PathBuf,
        #[source]
        source: tch::TchError,
    },
}

/// The timestamp (or a categorical name) did not parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not parse timestamp `{0}` (expected e.g. `2024-07-27 12:00`)")]
    Timestamp(String),

    #[error("unknown month `{0}`")]
    Month(String),

    #[error("unknown weekday `{0}`")]
    Weekday(String),

    #[error("malformed request body: {0}")]
    Body(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("distance must be a finite number, got {0}")]
    NonFiniteDistance(f64),

    #[error("distance must be >= 0, got {0}")]
    NegativeDistance(f64),

    #[error("distance {0} km is too large")]
    DistanceTooLarge(f64),

    #[error("passenger count must be >= 1, got {0}")]
    PassengerCount(i64),

    #[error("passenger count {0} is too large")]
    PassengerCountTooLarge(i64),
}

/// Scoring failed. The model layer has no schema of its own, so a shape
/// mismatch surfaces here rather than as a validation error.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("model produced a non-finite fare ({0})")]
    NonFinite(f64),

    #[cfg(feature = "torch")]
    #[error("torch forward failed: {0}")]
    Torch(#[from] tch::TchError),

    #[cfg(feature = "torch")]
    #[error("unexpected model output size: {0:?}")]
    OutputShape(Vec<i64>),
}

/// Failure of `encode`: bad timestamp or out-of-range numbers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Any failure along the load → encode → predict chain.
#[derive(Debug, Error)]
pub enum FareError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl From<EncodeError> for FareError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Parse(p) => FareError::Parse(p),
            EncodeError::Validation(v) => FareError::Validation(v),
        }
    }
}

impl FareError {
    /// Short machine-readable label used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            FareError::Load(_) => "load",
            FareError::Parse(_) => "parse",
            FareError::Validation(_) => "validation",
            FareError::Prediction(_) => "prediction",
        }
    }
}
