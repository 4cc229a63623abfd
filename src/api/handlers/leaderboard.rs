use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::LeaderboardPage;
use crate::services::leaderboard::{self, LeaderboardQuery};
use crate::AppState;

/// Raw query parameters. Everything arrives as text so malformed numbers
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardParams {
    pub league_id: Option<String>,
    pub gameweek: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl LeaderboardParams {
    fn into_query(self, max_page_size: usize) -> Result<LeaderboardQuery, AppError> {
        let league_id = match self.league_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AppError::BadRequest(format!("Invalid leagueId '{raw}'")))?,
            ),
        };
        let (limit, offset) =
            leaderboard::parse_pagination(self.limit.as_deref(), self.offset.as_deref(), max_page_size);

        Ok(LeaderboardQuery {
            league_id,
            gameweek: self.gameweek.as_deref().and_then(leaderboard::parse_gameweek),
            search: self.search.unwrap_or_default(),
            limit,
            offset,
        })
    }
}

/// GET /api/leaderboard
pub async fn get(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<ApiResponse<LeaderboardPage>>, AppError> {
    let query = params.into_query(state.config.leaderboard_max_page_size)?;
    let page = leaderboard::get_leaderboard(&state.db, &state.config.season, &query).await?;
    Ok(ApiResponse::ok(page))
}
