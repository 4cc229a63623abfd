use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Pick, Prediction, Scoreline, ThreeWayOdds};
use crate::scoring::ScoredPrediction;

/// Predictions for a fixture that have not been settled yet.
pub async fn get_unsettled_for_fixture(
    pool: &PgPool,
    fixture_id: Uuid,
) -> anyhow::Result<Vec<Prediction>> {
    let rows = sqlx::query_as::<_, Prediction>(
        "SELECT * FROM predictions WHERE fixture_id = $1 AND settled_at IS NULL ORDER BY submitted_at",
    )
    .bind(fixture_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Copy the fixture's locked price onto every prediction that has none,
/// choosing the leg that matches each prediction's pick. Returns the number
/// of predictions updated.
pub async fn snapshot_locked_odds(
    pool: &PgPool,
    fixture_id: Uuid,
    odds: &ThreeWayOdds,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE predictions
        SET locked_odds = CASE pick
            WHEN 'H' THEN $2
            WHEN 'D' THEN $3
            ELSE $4
        END
        WHERE fixture_id = $1 AND locked_odds IS NULL
        "#,
    )
    .bind(fixture_id)
    .bind(odds.home)
    .bind(odds.draw)
    .bind(odds.away)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Persist a prediction's score and settlement time. Only the first writer
/// wins; returns false if the prediction was already settled.
pub async fn settle_prediction(
    pool: &PgPool,
    id: Uuid,
    scored: &ScoredPrediction,
    settled_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE predictions
        SET points_awarded = $2,
            bonus_exact_score_points = $3,
            settled_at = $4
        WHERE id = $1 AND settled_at IS NULL
        "#,
    )
    .bind(id)
    .bind(scored.points_awarded)
    .bind(scored.bonus_exact_score_points)
    .bind(settled_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Insert or overwrite a prediction for (user, fixture, league scope).
///
/// The insert only happens while the fixture's kickoff is still after
/// `submitted_at`, and an existing settled prediction is never overwritten.
/// Returns `None` when either guard stopped the write.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_prediction(
    pool: &PgPool,
    user_id: Uuid,
    fixture_id: Uuid,
    league_id: Option<Uuid>,
    pick: Pick,
    stake: i32,
    locked_odds: Option<Decimal>,
    forecast: Scoreline,
    submitted_at: DateTime<Utc>,
) -> anyhow::Result<Option<Prediction>> {
    let row = sqlx::query_as::<_, Prediction>(
        r#"
        INSERT INTO predictions
            (user_id, fixture_id, league_id, pick, stake, locked_odds, pred_home_goals, pred_away_goals, submitted_at)
        SELECT $1::uuid, f.id, $3::uuid, $4::text, $5::int, $6::numeric, $7::int, $8::int, $9::timestamptz
        FROM fixtures f
        WHERE f.id = $2 AND f.kickoff_time > $9::timestamptz
        ON CONFLICT ON CONSTRAINT predictions_scope_unique DO UPDATE
        SET pick = EXCLUDED.pick,
            stake = EXCLUDED.stake,
            locked_odds = EXCLUDED.locked_odds,
            pred_home_goals = EXCLUDED.pred_home_goals,
            pred_away_goals = EXCLUDED.pred_away_goals,
            submitted_at = EXCLUDED.submitted_at
        WHERE predictions.settled_at IS NULL
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(fixture_id)
    .bind(league_id)
    .bind(pick.as_str())
    .bind(stake)
    .bind(locked_odds)
    .bind(forecast.home)
    .bind(forecast.away)
    .bind(submitted_at)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
