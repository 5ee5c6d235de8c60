use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::encoder::{self, FeatureVector};
use crate::error::{FareError, ParseError};
use crate::model::PredictionService;
use crate::types::{ErrorBody, FareResponse, Health, TripRequest};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<PredictionService>,
    pub log_pred: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

// ---------- Handlers ----------

type ApiError = (StatusCode, Json<ErrorBody>);

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Result<Json<FareResponse>, ApiError> {
    // Wrong types or missing fields are a parse failure, not validation.
    let Json(req) =
        payload.map_err(|r| api_error(ParseError::Body(r.body_text()).into()))?;

    let features = encoder::encode(&req.timestamp, req.distance_km, req.passenger_count)
        .map_err(|e| api_error(e.into()))?;

    if state.log_pred {
        log_features(&features);
    }

    let fare = state
        .svc
        .predict(&features)
        .map_err(|e| api_error(e.into()))?;

    Ok(Json(FareResponse {
        fare,
        features,
        model_version: state.svc.version().map(str::to_string),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        in_dim: state.svc.in_dim(),
    })
}

fn api_error(e: FareError) -> ApiError {
    let status = match &e {
        FareError::Parse(_) => StatusCode::BAD_REQUEST,
        FareError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FareError::Prediction(_) | FareError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("prediction failed: {}", e);
    } else {
        tracing::debug!("rejected request: {}", e);
    }
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
            kind: e.kind().to_string(),
        }),
    )
}

// Debug signal so an all-zero or misaligned vector is visible in the logs.
fn log_features(features: &FeatureVector) {
    let vec = features.to_vec();
    let nz = vec.iter().filter(|x| **x != 0.0).count();
    let hot: Vec<String> = features
        .named()
        .filter(|(_, v)| *v != 0.0)
        .map(|(name, v)| format!("{}={:.3}", name, v))
        .collect();
    tracing::info!(
        "encoded in_dim={} nonzero={} [{}]",
        vec.len(),
        nz,
        hot.join(", ")
    );
}
