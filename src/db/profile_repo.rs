use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileName {
    pub id: Uuid,
    pub display_name: Option<String>,
}

/// Display names for the given users. Users without a profile, or with a
/// blank name, are simply absent from the map.
pub async fn get_display_names(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, String>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ProfileName>(
        "SELECT id, display_name FROM profiles WHERE id = ANY($1)",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|p| {
            let name = p.display_name?.trim().to_string();
            (!name.is_empty()).then_some((p.id, name))
        })
        .collect())
}
