use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::ApiResponse;
use crate::db::fixture_repo;
use crate::errors::AppError;
use crate::models::{Fixture, Pick};
use crate::scoring::{effective_odds, potential_points};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PickPreview {
    pub pick: Pick,
    /// Price shown to the player; `None` when the fixture has no odds yet.
    pub odds: Option<Decimal>,
    pub result_points: i32,
    pub exact_score_bonus: i32,
}

#[derive(Debug, Serialize)]
pub struct PotentialPointsResponse {
    pub fixture_id: Uuid,
    pub stake: i32,
    pub odds_locked: bool,
    pub bookmaker: Option<String>,
    pub picks: Vec<PickPreview>,
}

pub fn preview(fixture: &Fixture, stake: i32) -> PotentialPointsResponse {
    let odds = fixture.display_odds();

    let picks = Pick::ALL
        .iter()
        .map(|&pick| {
            let price = odds.map(|o| o.for_pick(pick)).filter(|p| *p > Decimal::ZERO);
            let points = potential_points(effective_odds(price, None), stake);
            PickPreview {
                pick,
                odds: price,
                result_points: points.result_points,
                exact_score_bonus: points.exact_score_bonus,
            }
        })
        .collect();

    let bookmaker = if fixture.is_locked() {
        fixture.odds_bookmaker.clone()
    } else {
        fixture.odds_current_bookmaker.clone()
    };

    PotentialPointsResponse {
        fixture_id: fixture.id,
        stake,
        odds_locked: fixture.is_locked(),
        bookmaker,
        picks,
    }
}

/// GET /api/fixtures/:id/potential-points
pub async fn potential_points_for_fixture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PotentialPointsResponse>>, AppError> {
    let fixture = fixture_repo::get_fixture(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Fixture {id} not found")))?;

    Ok(ApiResponse::ok(preview(&fixture, state.config.stake)))
}
