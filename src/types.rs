use serde::{Deserialize, Serialize};

use crate::encoder::FeatureVector;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TripRequest {
    pub timestamp: String,           // e.g. "2024-07-27 12:00"
    pub distance_km: f64,
    pub passenger_count: i64,        // signed so 0 / negatives reach validation
}

#[derive(Debug, Serialize, Clone)]
pub struct FareResponse {
    pub fare: f64,
    pub features: FeatureVector,     // echoed for diagnostics, schema order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Health {
    pub status: String,
    pub in_dim: usize,
}
