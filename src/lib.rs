//! Taxi fare estimation: encode a trip into the model's feature vector and
//! score it with a regression model loaded once at startup.

pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod server;
pub mod types;

pub use encoder::{encode, FeatureVector, RawTripInput, TimeOfDay, FEATURE_COUNT, FEATURE_NAMES};
pub use error::{EncodeError, FareError, LoadError, ParseError, PredictionError, ValidationError};
pub use model::{Estimate, LinearModel, PredictionService};
