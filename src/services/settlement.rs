use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{fixture_repo, prediction_repo};
use crate::errors::JobError;
use crate::models::{Fixture, FixtureStatus, Prediction, Scoreline};
use crate::scoring::{score_prediction, ScoredPrediction, Wager, DEFAULT_STAKE};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SettlementSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gameweek: Option<i32>,
    pub fixtures_processed: usize,
    /// Finished fixtures left alone because no score is recorded.
    pub fixtures_skipped: usize,
    pub predictions_considered: usize,
    pub predictions_settled: usize,
    /// Settled by a concurrent run between our read and our write.
    pub already_settled: usize,
    /// Predictions whose write failed.
    pub failed: usize,
    /// Fixtures whose predictions could not be loaded.
    pub fixtures_failed: usize,
    pub note: String,
}

impl SettlementSummary {
    fn finish_note(&mut self) {
        self.note = if self.failed > 0 || self.fixtures_failed > 0 {
            format!(
                "Settled {} of {} prediction(s); {} prediction(s) and {} fixture(s) failed and will be retried.",
                self.predictions_settled, self.predictions_considered, self.failed, self.fixtures_failed
            )
        } else if self.fixtures_processed == 0 && self.fixtures_skipped == 0 {
            "No finished fixtures to settle.".into()
        } else if self.predictions_considered == 0 {
            "No unsettled predictions; nothing to do.".into()
        } else {
            format!("Settled {} prediction(s).", self.predictions_settled)
        };
    }
}

/// Score a single prediction against the fixture's final result. The
/// fixture supplies fallback odds when the prediction never captured one.
pub fn score_against_fixture(
    prediction: &Prediction,
    fixture: &Fixture,
    result: Scoreline,
) -> Option<ScoredPrediction> {
    let pick = prediction.pick()?;
    let stake = if prediction.stake > 0 {
        prediction.stake
    } else {
        DEFAULT_STAKE
    };
    let wager = Wager {
        pick,
        stake,
        locked_odds: prediction.locked_odds,
        forecast: prediction.forecast(),
    };

    Some(score_prediction(
        &wager,
        result,
        fixture.settlement_fallback_odds(pick),
    ))
}

/// Settle one fixture.
///
/// With `result`, the fixture is first marked finished with that score
/// (replaying the same result is harmless). Without it, the fixture must
/// already be finished with a recorded score. Only predictions that are
/// still unsettled are scored, so a re-run settles nothing new.
pub async fn settle_fixture(
    pool: &PgPool,
    fixture_id: Uuid,
    result: Option<Scoreline>,
) -> Result<SettlementSummary, JobError> {
    if let Some(score) = result {
        if !score.is_valid() {
            return Err(JobError::Invariant(format!(
                "final score {score} has negative goals"
            )));
        }
    }

    let started = Instant::now();
    let mut fixture = fixture_repo::get_fixture(pool, fixture_id)
        .await?
        .ok_or_else(|| JobError::NotFound(format!("fixture {fixture_id}")))?;

    let score = match result {
        Some(score) => {
            fixture_repo::record_result(pool, fixture.id, score).await?;
            tracing::info!(fixture_id = %fixture.id, score = %score, "Result recorded");
            fixture.status = FixtureStatus::Finished.as_str().into();
            fixture.home_goals = Some(score.home);
            fixture.away_goals = Some(score.away);
            score
        }
        None => {
            if !fixture.is_finished() {
                return Err(JobError::Invariant(format!(
                    "fixture {fixture_id} is not finished"
                )));
            }
            fixture.final_score().ok_or_else(|| {
                JobError::Invariant(format!("fixture {fixture_id} has no recorded score"))
            })?
        }
    };

    let mut summary = SettlementSummary::default();
    settle_predictions(pool, &fixture, score, &mut summary).await?;
    summary.fixtures_processed = 1;
    summary.finish_note();

    histogram!("job_duration_seconds", "job" => "settle_fixture")
        .record(started.elapsed().as_secs_f64());

    Ok(summary)
}

/// Settle every finished fixture of a gameweek. With no gameweek given,
/// the current one is the gameweek of the most recently kicked-off finished
/// fixture.
pub async fn settle_gameweek(
    pool: &PgPool,
    season: &str,
    gameweek: Option<i32>,
) -> Result<SettlementSummary, JobError> {
    let started = Instant::now();

    let gameweek = match gameweek {
        Some(gw) => gw,
        None => fixture_repo::latest_finished_gameweek(pool, season)
            .await?
            .ok_or_else(|| {
                JobError::Invariant(format!(
                    "no finished gameweek found for season {season}; record results or pass a gameweek"
                ))
            })?,
    };

    let mut summary = SettlementSummary {
        season: Some(season.to_string()),
        gameweek: Some(gameweek),
        ..Default::default()
    };

    let fixtures = fixture_repo::get_finished_in_gameweek(pool, season, gameweek).await?;

    for fixture in &fixtures {
        let Some(score) = fixture.final_score() else {
            tracing::warn!(fixture_id = %fixture.id, "Finished fixture has no score, skipping");
            summary.fixtures_skipped += 1;
            continue;
        };

        if let Err(e) = settle_predictions(pool, fixture, score, &mut summary).await {
            tracing::error!(error = %e, fixture_id = %fixture.id, "Failed to load predictions");
            summary.fixtures_failed += 1;
            continue;
        }
        summary.fixtures_processed += 1;
    }

    summary.finish_note();
    tracing::info!(
        season,
        gameweek,
        fixtures = summary.fixtures_processed,
        settled = summary.predictions_settled,
        failed = summary.failed,
        fixtures_failed = summary.fixtures_failed,
        "Gameweek settlement complete"
    );

    histogram!("job_duration_seconds", "job" => "settle_gameweek")
        .record(started.elapsed().as_secs_f64());

    Ok(summary)
}

async fn settle_predictions(
    pool: &PgPool,
    fixture: &Fixture,
    score: Scoreline,
    summary: &mut SettlementSummary,
) -> Result<(), JobError> {
    let predictions = prediction_repo::get_unsettled_for_fixture(pool, fixture.id).await?;
    summary.predictions_considered += predictions.len();

    for prediction in &predictions {
        let Some(scored) = score_against_fixture(prediction, fixture, score) else {
            tracing::warn!(
                prediction_id = %prediction.id,
                pick = %prediction.pick,
                "Unrecognised pick, skipping"
            );
            counter!("settlement_write_failures_total").increment(1);
            summary.failed += 1;
            continue;
        };

        match prediction_repo::settle_prediction(pool, prediction.id, &scored, Utc::now()).await {
            Ok(true) => {
                summary.predictions_settled += 1;
                counter!("predictions_settled_total").increment(1);
                tracing::debug!(
                    prediction_id = %prediction.id,
                    points = scored.points_awarded,
                    bonus = scored.bonus_exact_score_points,
                    "Prediction settled"
                );
            }
            Ok(false) => summary.already_settled += 1,
            Err(e) => {
                tracing::error!(error = %e, prediction_id = %prediction.id, "Failed to settle prediction");
                counter!("settlement_write_failures_total").increment(1);
                summary.failed += 1;
            }
        }
    }

    Ok(())
}
