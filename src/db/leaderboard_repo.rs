use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LeaderboardRow;

/// Settled predictions that count towards a leaderboard.
///
/// - `league_id = None`: global-scope predictions only.
/// - `league_id = Some(l)`: predictions scoped to `l` by its current members.
/// - `gameweek = Some(gw)`: only fixtures of that gameweek in `season`.
pub async fn get_settled_rows(
    pool: &PgPool,
    league_id: Option<Uuid>,
    gameweek: Option<i32>,
    season: &str,
) -> anyhow::Result<Vec<LeaderboardRow>> {
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT p.user_id, p.points_awarded, p.bonus_exact_score_points
        FROM predictions p
        JOIN fixtures f ON f.id = p.fixture_id
        WHERE p.settled_at IS NOT NULL
          AND (
                ($1::uuid IS NULL AND p.league_id IS NULL)
             OR (p.league_id = $1 AND EXISTS (
                    SELECT 1 FROM league_members m
                    WHERE m.league_id = $1 AND m.user_id = p.user_id))
          )
          AND ($2::int IS NULL OR (f.gameweek = $2 AND f.season = $3))
        "#,
    )
    .bind(league_id)
    .bind(gameweek)
    .bind(season)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
