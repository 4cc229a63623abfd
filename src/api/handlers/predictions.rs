use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{Prediction, PredictionRequest};
use crate::services::submission;
use crate::AppState;

/// POST /api/predictions creates or replaces a prediction before kickoff.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<ApiResponse<Prediction>>, AppError> {
    let prediction =
        submission::submit_prediction(&state.db, &request, state.config.stake, Utc::now()).await?;
    Ok(ApiResponse::ok(prediction))
}
