use sqlx::PgPool;
use uuid::Uuid;

/// Whether the user belongs to the league. Membership itself is managed
/// elsewhere; this service only reads it.
pub async fn is_member(pool: &PgPool, league_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM league_members WHERE league_id = $1 AND user_id = $2)",
    )
    .bind(league_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn get_league_name(pool: &PgPool, league_id: Uuid) -> anyhow::Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT name FROM leagues WHERE id = $1")
        .bind(league_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.0))
}
