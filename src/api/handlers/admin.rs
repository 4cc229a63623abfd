use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::ApiResponse;
use crate::db::fixture_repo;
use crate::errors::AppError;
use crate::models::Scoreline;
use crate::services::leaderboard::parse_gameweek;
use crate::services::odds_cycle::CycleSummary;
use crate::services::odds_lock::LockSummary;
use crate::services::odds_mapping::MappingSummary;
use crate::services::odds_refresh::RefreshSummary;
use crate::services::result_sync::SyncSummary;
use crate::services::settlement::SettlementSummary;
use crate::services::{odds_cycle, odds_lock, odds_mapping, odds_refresh, result_sync, settlement};
use crate::AppState;

/// Optional `?now=` override so a pass can be replayed against a past or
/// future clock.
#[derive(Debug, Deserialize)]
pub struct ClockParams {
    pub now: Option<DateTime<Utc>>,
}

impl ClockParams {
    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// POST /api/admin/lock-odds
pub async fn lock_odds(
    State(state): State<AppState>,
    Query(clock): Query<ClockParams>,
) -> Result<Json<ApiResponse<LockSummary>>, AppError> {
    let summary = odds_lock::run_lock_pass(
        &state.db,
        state.odds_client.as_ref(),
        &state.config,
        clock.now(),
    )
    .await?;
    Ok(ApiResponse::ok(summary))
}

/// POST /api/admin/map-odds
pub async fn map_odds(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MappingSummary>>, AppError> {
    let summary = odds_mapping::run_mapping_pass(&state.db, state.odds_client.as_ref()).await?;
    Ok(ApiResponse::ok(summary))
}

/// POST /api/admin/refresh-odds
pub async fn refresh_odds(
    State(state): State<AppState>,
    Query(clock): Query<ClockParams>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let summary = odds_refresh::run_refresh_pass(
        &state.db,
        state.odds_client.as_ref(),
        &state.config,
        clock.now(),
    )
    .await?;
    Ok(ApiResponse::ok(summary))
}

/// POST /api/admin/odds-cycle. Answers 207 when some step failed.
pub async fn run_odds_cycle(
    State(state): State<AppState>,
    Query(clock): Query<ClockParams>,
) -> Response {
    let summary: CycleSummary = odds_cycle::run_odds_cycle(
        &state.db,
        state.odds_client.as_ref(),
        &state.config,
        clock.now(),
    )
    .await;

    let status = if summary.success {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(summary)).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleFixtureRequest {
    pub fixture_id: Uuid,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
}

/// POST /api/admin/settle-fixture. Optionally record the final score first.
pub async fn settle_fixture(
    State(state): State<AppState>,
    Json(req): Json<SettleFixtureRequest>,
) -> Result<Json<ApiResponse<SettlementSummary>>, AppError> {
    let result = match (req.home_goals, req.away_goals) {
        (Some(home), Some(away)) => Some(Scoreline::new(home, away)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "homeGoals and awayGoals must be given together".into(),
            ))
        }
    };

    let summary = settlement::settle_fixture(&state.db, req.fixture_id, result).await?;
    Ok(ApiResponse::ok(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreGameweekRequest {
    pub season: Option<String>,
    /// A gameweek number, or `"current"` / absent for the current gameweek.
    pub gameweek: Option<Value>,
}

fn requested_gameweek(raw: Option<&Value>) -> Option<i32> {
    match raw? {
        Value::Number(n) => parse_gameweek(&n.to_string()),
        Value::String(s) => parse_gameweek(s),
        _ => None,
    }
}

/// POST /api/admin/score-gameweek
pub async fn score_gameweek(
    State(state): State<AppState>,
    body: Option<Json<ScoreGameweekRequest>>,
) -> Result<Json<ApiResponse<SettlementSummary>>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let season = req.season.unwrap_or_else(|| state.config.season.clone());
    let gameweek = requested_gameweek(req.gameweek.as_ref());

    let summary = settlement::settle_gameweek(&state.db, &season, gameweek).await?;
    Ok(ApiResponse::ok(summary))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResultsRequest {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// POST /api/admin/sync-results
pub async fn sync_results(
    State(state): State<AppState>,
    body: Option<Json<SyncResultsRequest>>,
) -> Result<Json<ApiResponse<SyncSummary>>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let (default_from, default_to) = result_sync::default_window(Utc::now());

    let summary = result_sync::sync_results(
        &state.db,
        state.results_client.as_ref(),
        &state.config,
        req.date_from.unwrap_or(default_from),
        req.date_to.unwrap_or(default_to),
    )
    .await?;
    Ok(ApiResponse::ok(summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    pub fixture_id: Uuid,
    pub home_goals: i32,
    pub away_goals: i32,
}

/// POST /api/admin/update-score. In-play score; the fixture stays scheduled.
pub async fn update_score(
    State(state): State<AppState>,
    Json(req): Json<UpdateScoreRequest>,
) -> Result<Json<ApiResponse<Scoreline>>, AppError> {
    let score = Scoreline::new(req.home_goals, req.away_goals);
    if !score.is_valid() {
        return Err(AppError::BadRequest("Goals must be non-negative".into()));
    }

    if !fixture_repo::update_score(&state.db, req.fixture_id, score).await? {
        return Err(AppError::NotFound(format!("Fixture {} not found", req.fixture_id)));
    }
    tracing::info!(fixture_id = %req.fixture_id, score = %score, "Live score updated");

    Ok(ApiResponse::ok(score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requested_gameweek() {
        assert_eq!(requested_gameweek(None), None);
        assert_eq!(requested_gameweek(Some(&json!(26))), Some(26));
        assert_eq!(requested_gameweek(Some(&json!("26"))), Some(26));
        assert_eq!(requested_gameweek(Some(&json!("current"))), None);
        assert_eq!(requested_gameweek(Some(&json!(0))), None);
        assert_eq!(requested_gameweek(Some(&Value::Null)), None);
    }
}
