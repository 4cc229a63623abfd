use chrono::{DateTime, Utc};
use metrics::counter;
use sqlx::PgPool;

use crate::db::{fixture_repo, league_repo, prediction_repo};
use crate::errors::AppError;
use crate::models::{Pick, Prediction, PredictionRequest, Scoreline};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Invalid(String),

    #[error("fixture not found")]
    FixtureNotFound,

    #[error("predictions closed (kickoff passed)")]
    KickoffPassed,

    #[error("prediction already settled")]
    AlreadySettled,

    #[error("not a member of this league")]
    NotMember,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Invalid(msg) => AppError::BadRequest(msg),
            SubmissionError::FixtureNotFound => AppError::NotFound("Fixture not found".into()),
            SubmissionError::KickoffPassed | SubmissionError::AlreadySettled => {
                AppError::Conflict(e.to_string())
            }
            SubmissionError::NotMember => AppError::Forbidden(e.to_string()),
            SubmissionError::Internal(e) => AppError::Internal(e),
        }
    }
}

/// Pick implied by the forecast. An explicit pick must agree with it.
pub fn resolve_pick(explicit: Option<&str>, forecast: Scoreline) -> Result<Pick, SubmissionError> {
    if !forecast.is_valid() {
        return Err(SubmissionError::Invalid("Invalid score".into()));
    }

    let derived = forecast.outcome();
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(derived),
        Some(raw) => {
            let pick = Pick::parse(raw)
                .ok_or_else(|| SubmissionError::Invalid(format!("Unknown pick '{raw}'")))?;
            if pick != derived {
                return Err(SubmissionError::Invalid(
                    "Score must match result (home win / draw / away win)".into(),
                ));
            }
            Ok(pick)
        }
    }
}

/// Create or replace a user's prediction for a fixture in one scope
/// (global or a league).
///
/// Odds are captured at submission: the locked price if the fixture is
/// already locked, else the current snapshot. Closed once the fixture
/// kicks off; a settled prediction is never overwritten.
pub async fn submit_prediction(
    pool: &PgPool,
    request: &PredictionRequest,
    stake: i32,
    now: DateTime<Utc>,
) -> Result<Prediction, SubmissionError> {
    let forecast = Scoreline::new(request.pred_home_goals, request.pred_away_goals);
    let pick = resolve_pick(request.pick.as_deref(), forecast)?;

    if let Some(league_id) = request.league_id {
        if !league_repo::is_member(pool, league_id, request.user_id).await? {
            return Err(SubmissionError::NotMember);
        }
    }

    let fixture = fixture_repo::get_fixture(pool, request.fixture_id)
        .await?
        .ok_or(SubmissionError::FixtureNotFound)?;

    if now >= fixture.kickoff_time {
        return Err(SubmissionError::KickoffPassed);
    }

    let locked_odds = fixture.submission_odds(pick);

    let saved = prediction_repo::upsert_prediction(
        pool,
        request.user_id,
        fixture.id,
        request.league_id,
        pick,
        stake,
        locked_odds,
        forecast,
        now,
    )
    .await?;

    // Kickoff was checked against the same clock, so an empty result means
    // the existing row is settled.
    let Some(prediction) = saved else {
        return Err(SubmissionError::AlreadySettled);
    };

    counter!("predictions_submitted_total").increment(1);
    tracing::info!(
        prediction_id = %prediction.id,
        user_id = %prediction.user_id,
        fixture_id = %prediction.fixture_id,
        pick = %pick,
        forecast = %forecast,
        "Prediction submitted"
    );

    Ok(prediction)
}
