use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Fixture, Scoreline, ThreeWayOdds};

/// Get a single fixture by id.
pub async fn get_fixture(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Fixture>> {
    let row = sqlx::query_as::<_, Fixture>("SELECT * FROM fixtures WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// Unlocked, mapped fixtures kicking off inside `[from, to]`.
pub async fn get_lock_candidates(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Vec<Fixture>> {
    let rows = sqlx::query_as::<_, Fixture>(
        r#"
        SELECT * FROM fixtures
        WHERE kickoff_time >= $1
          AND kickoff_time <= $2
          AND odds_locked_at IS NULL
          AND odds_api_event_id IS NOT NULL
        ORDER BY kickoff_time
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Write the locked snapshot, only if the fixture is still unlocked.
/// Returns false when another run already locked it.
pub async fn lock_odds(
    pool: &PgPool,
    id: Uuid,
    odds: &ThreeWayOdds,
    bookmaker: Option<&str>,
    locked_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET odds_home = $2,
            odds_draw = $3,
            odds_away = $4,
            odds_bookmaker = $5,
            odds_locked_at = $6,
            updated_at = NOW()
        WHERE id = $1 AND odds_locked_at IS NULL
        "#,
    )
    .bind(id)
    .bind(odds.home)
    .bind(odds.draw)
    .bind(odds.away)
    .bind(bookmaker)
    .bind(locked_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Unlocked, mapped fixtures kicking off after `from` and no later than `to`.
pub async fn get_refresh_candidates(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Vec<Fixture>> {
    let rows = sqlx::query_as::<_, Fixture>(
        r#"
        SELECT * FROM fixtures
        WHERE kickoff_time > $1
          AND kickoff_time <= $2
          AND odds_locked_at IS NULL
          AND odds_api_event_id IS NOT NULL
        ORDER BY kickoff_time
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Refresh the current snapshot. Locked fixtures are left alone.
pub async fn update_current_odds(
    pool: &PgPool,
    id: Uuid,
    odds: &ThreeWayOdds,
    bookmaker: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET odds_home_current = $2,
            odds_draw_current = $3,
            odds_away_current = $4,
            odds_current_bookmaker = $5,
            odds_current_updated_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND odds_locked_at IS NULL
        "#,
    )
    .bind(id)
    .bind(odds.home)
    .bind(odds.draw)
    .bind(odds.away)
    .bind(bookmaker)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Fixtures in `[from, to]` without a provider event reference.
pub async fn get_unmapped_in_window(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Vec<Fixture>> {
    let rows = sqlx::query_as::<_, Fixture>(
        r#"
        SELECT * FROM fixtures
        WHERE kickoff_time >= $1
          AND kickoff_time <= $2
          AND odds_api_event_id IS NULL
        ORDER BY kickoff_time
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count all fixtures in `[from, to]`, mapped or not.
pub async fn count_in_window(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM fixtures WHERE kickoff_time >= $1 AND kickoff_time <= $2",
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Whether any fixture already carries this provider event id.
pub async fn is_event_mapped(pool: &PgPool, event_id: &str) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM fixtures WHERE odds_api_event_id = $1)",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Set the provider event reference once.
pub async fn set_event_reference(pool: &PgPool, id: Uuid, event_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET odds_api_event_id = $2, updated_at = NOW()
        WHERE id = $1 AND odds_api_event_id IS NULL
        "#,
    )
    .bind(id)
    .bind(event_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Fixtures of a season kicking off inside `[from, to]`.
pub async fn get_fixtures_in_range(
    pool: &PgPool,
    season: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Vec<Fixture>> {
    let rows = sqlx::query_as::<_, Fixture>(
        r#"
        SELECT * FROM fixtures
        WHERE season = $1 AND kickoff_time >= $2 AND kickoff_time <= $3
        ORDER BY kickoff_time
        "#,
    )
    .bind(season)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Mark a fixture finished with its final score. Replaying the same result
/// is harmless.
pub async fn record_result(pool: &PgPool, id: Uuid, score: Scoreline) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET status = 'finished', home_goals = $2, away_goals = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(score.home)
    .bind(score.away)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Set the in-play score without finishing the fixture.
pub async fn update_score(pool: &PgPool, id: Uuid, score: Scoreline) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET home_goals = $2, away_goals = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(score.home)
    .bind(score.away)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Apply a result-feed observation. A finished fixture never goes back to
/// scheduled, and a missing score leaves the stored goals untouched.
pub async fn apply_feed_result(
    pool: &PgPool,
    id: Uuid,
    finished: bool,
    score: Option<Scoreline>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fixtures
        SET status = CASE WHEN $2::boolean THEN 'finished' ELSE status END,
            home_goals = COALESCE($3::int, home_goals),
            away_goals = COALESCE($4::int, away_goals),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(finished)
    .bind(score.map(|s| s.home))
    .bind(score.map(|s| s.away))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

// ---------------------------------------------------------------------------
// Gameweeks
// ---------------------------------------------------------------------------

/// Gameweek of the most recently kicked-off finished fixture. Rescheduled
/// fixtures played early do not move the current gameweek forward.
pub async fn latest_finished_gameweek(pool: &PgPool, season: &str) -> anyhow::Result<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT gameweek FROM fixtures
        WHERE season = $1 AND status = 'finished' AND gameweek IS NOT NULL
        ORDER BY kickoff_time DESC
        LIMIT 1
        "#,
    )
    .bind(season)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

pub async fn get_finished_in_gameweek(
    pool: &PgPool,
    season: &str,
    gameweek: i32,
) -> anyhow::Result<Vec<Fixture>> {
    let rows = sqlx::query_as::<_, Fixture>(
        r#"
        SELECT * FROM fixtures
        WHERE season = $1 AND gameweek = $2 AND status = 'finished'
        ORDER BY kickoff_time
        "#,
    )
    .bind(season)
    .bind(gameweek)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
